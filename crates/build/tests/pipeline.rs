use std::fs;
use std::path::Path;
use tinypack_build::{BuildMode, Manifest, PackError};

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A minimal project in the default layout
fn create_project(root: &Path) {
    write(root, "src/constants.json", r#"{"SPEED": 5}"#);
    write(root, "src/index.html", "<html>\n  <script>__clientJS</script>\n</html>\n");
    write(root, "src/index.debug.html", "<html>\n  <body>\n    <script>__clientJS</script>\n  </body>\n</html>\n");
    write(
        root,
        "src/client.js",
        "//__include shaders.gen.js\nlet song = __includeSongData({songData: [], rowLen: 1});\nlet title = \"ship\";\ngl.drawArrays(gl.TRIANGLES, 0, 3);",
    );
    write(root, "src/shared.js", "let $speed = () => SPEED;");
    write(root, "src/server.js", "  //__inlineFile util.js\nserve();");
    write(root, "src/util.js", "function serve() {}");
    write(root, "shaders/a.vert", "attribute vec3 a_position;");
    write(root, "shaders/b.frag", "//__include a.vert\nvoid main(){}");
    write(root, "public/favicon.ico", "ico");
}

#[test]
fn test_debug_build_writes_readable_output() {
    let dir = tempfile::tempdir().unwrap();
    create_project(dir.path());

    let manifest = Manifest::discover(dir.path()).unwrap();
    let report = tinypack_build::run(&manifest, BuildMode::Debug).unwrap();
    assert!(report.is_none());

    let module = fs::read_to_string(dir.path().join("src/shaders.gen.js")).unwrap();
    assert_eq!(module, "let a_vert = `attribute vec3 a_position;`;\n\nlet b_frag = a_vert + `//__include a.vert\nvoid main(){}`;\n\n");

    let build = dir.path().join("build");
    let shared = fs::read_to_string(build.join("shared.js")).unwrap();
    assert_eq!(shared, "let SPEED = 5;\nlet __DEBUG = true;\nlet $speed = () => SPEED;");

    let server = fs::read_to_string(build.join("server.js")).unwrap();
    assert_eq!(server, "function serve() {}\nserve();");

    let html = fs::read_to_string(build.join("index.html")).unwrap();
    assert!(html.starts_with("<html><body><script>let a_vert = `attribute vec3 a_position;`;"));
    assert!(html.contains("let song = [[],1,,,];"));
    assert!(html.contains("let title = 'ship';"));
    assert!(html.contains("gl.drawArrays(gl.TRIANGLES, 0, 3);"));
    assert!(html.ends_with("</script></body></html>"));
    assert!(!html.contains("__clientJS"));

    assert_eq!(fs::read_to_string(build.join("favicon.ico")).unwrap(), "ico");
    assert!(!dir.path().join("bundle.zip").exists());
}

#[test]
fn test_debug_build_replaces_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    create_project(dir.path());
    write(dir.path(), "build/stale.js", "old");

    let manifest = Manifest::discover(dir.path()).unwrap();
    tinypack_build::run(&manifest, BuildMode::Debug).unwrap();

    assert!(!dir.path().join("build/stale.js").exists());
    assert!(dir.path().join("build/index.html").exists());
}

#[test]
fn test_manifest_overrides_layout() {
    let dir = tempfile::tempdir().unwrap();
    create_project(dir.path());
    write(dir.path(), "tinypack.yaml", "out_dir: dist\nshader_module: gen/shaders.js\n");
    fs::create_dir_all(dir.path().join("src/gen")).unwrap();
    write(dir.path(), "src/client.js", "//__include gen/shaders.js\nmain();");

    let manifest = Manifest::discover(dir.path()).unwrap();
    tinypack_build::run(&manifest, BuildMode::Debug).unwrap();

    assert!(dir.path().join("src/gen/shaders.js").exists());
    let html = fs::read_to_string(dir.path().join("dist/index.html")).unwrap();
    assert!(html.contains("let b_frag = a_vert +"));
    assert!(!dir.path().join("build").exists());
}

#[test]
fn test_missing_include_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    create_project(dir.path());
    write(dir.path(), "src/server.js", "//__include missing.js");

    let manifest = Manifest::discover(dir.path()).unwrap();
    let err = tinypack_build::run(&manifest, BuildMode::Debug).unwrap_err();
    assert!(matches!(err, PackError::Io { ref path, .. } if path.ends_with("missing.js")));
    assert!(!dir.path().join("build").exists());
}

#[test]
fn test_file_name_exhaustion_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    create_project(dir.path());
    // Minified shader packing needs the external minifier, so leave the shader tree empty
    fs::remove_dir_all(dir.path().join("shaders")).unwrap();
    fs::create_dir_all(dir.path().join("shaders")).unwrap();
    for i in 0..26 {
        write(dir.path(), &format!("public/sprite{i}.png"), "png");
    }

    let manifest = Manifest::discover(dir.path()).unwrap();
    let err = tinypack_build::run(&manifest, BuildMode::Minified).unwrap_err();
    assert!(matches!(err, PackError::NamePoolExhausted { pool: "files", requested: 27, available: 26 }));
    assert!(!dir.path().join("build").exists());
}
