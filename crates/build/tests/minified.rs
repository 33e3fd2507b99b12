//! Minified builds with shell scripts standing in for the external tools

#![cfg(unix)]

use std::fs;
use std::path::Path;
use tinypack_build::{BuildMode, Manifest, PackError};

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Emits `var <file_name> =\n "<source without directive lines>";` like the GLSL minifier's JS format
const SHADER_MINIFIER: &str = r#"prev=
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  if [ "$arg" = "-o" ]; then input="$prev"; fi
  prev="$arg"
done
name=$(basename "$input" | tr . _)
body=$(grep -v '^//__' "$input" | tr -d '\n')
printf 'var %s =\n "%s";\n' "$name" "$body" > "$out"
"#;

/// Echoes the prepared bundle unchanged
const JS_MINIFIER: &str = "cat \"$1\"\n";

/// Skips `-q -a -4`, then bundles the listed entries into the archive
const ARCHIVER: &str = "shift 3\nout=\"$1\"\nshift\ntar -cf \"$out\" \"$@\"\n";

/// The archiver runs inside the output directory, so every script is referenced by absolute path
fn manifest(root: &Path) -> String {
    let tool = |name: &str| format!("[\"sh\", \"{}\"]", root.join("tools").join(name).display());
    format!(
        "budget: 100000\ntools:\n  shader_minifier: {}\n  js_minifier: {}\n  archiver: {}\n",
        tool("shader_minifier.sh"),
        tool("js_minifier.sh"),
        tool("archiver.sh")
    )
}

fn create_project(root: &Path) {
    write(root, "tinypack.yaml", &manifest(root));
    write(root, "tools/shader_minifier.sh", SHADER_MINIFIER);
    write(root, "tools/js_minifier.sh", JS_MINIFIER);
    write(root, "tools/archiver.sh", ARCHIVER);

    write(root, "webgl-funcs.json", r#"{"TRIANGLES": 4, "drawArrays": null, "getUniformLocation": null, "uniform2f": null}"#);
    write(root, "src/constants.json", r#"{"SPEED": 5}"#);
    write(root, "src/index.html", "<html>\n  <script>__clientJS</script>\n</html>\n");
    write(root, "src/index.debug.html", "<html><script>__clientJS</script></html>");
    write(
        root,
        "src/client.js",
        concat!(
            "//__include shaders.gen.js\n",
            "//__insertGLOptimize\n",
            "gl.uniform2f(gl.getUniformLocation(p, \"u_res\"), 1, 2);\n",
            "img.src = \"favicon.ico\";\n",
            "let song = __includeSongData({songData: [], rowLen: 1});\n",
            "gl.drawArrays(gl.TRIANGLES, 0, 3);",
        ),
    );
    write(root, "src/shared.js", "let $speed = () => SPEED;");
    write(root, "src/server.js", "$speed();");
    write(root, "shaders/noise.glsl", "//__export\nfloat fbm(vec2 p){return p.x;}");
    write(root, "shaders/b.frag", "//__include noise.glsl\nuniform vec2 u_res;void main(){gl_FragColor=vec4(fbm(u_res));}");
    write(root, "public/favicon.ico", "ico");
}

#[test]
fn test_minified_build_renames_mangles_and_archives() {
    let dir = tempfile::tempdir().unwrap();
    create_project(dir.path());

    let manifest = Manifest::discover(dir.path()).unwrap();
    let report = tinypack_build::run(&manifest, BuildMode::Minified).unwrap().unwrap();

    let module = fs::read_to_string(dir.path().join("src/shaders.gen.js")).unwrap();
    assert_eq!(
        module,
        "let noise_glsl =\n \"float za(vec2 p){return p.x;}\";\nlet b_frag = noise_glsl +\n \"uniform vec2 u_res;void main(){gl_FragColor=vec4(za(u_res));}\";\n"
    );

    let build = dir.path().join("build");
    let html = fs::read_to_string(build.join("index.html")).unwrap();
    assert!(html.starts_with("<html><script>let noise_glsl =\n 'float za(vec2 p){return p.x;}';"));
    assert!(html.contains("'uniform vec2 zb;void main(){gl_FragColor=vec4(za(zb));}'"));
    assert!(html.contains("webglFuncs.sort().indexOf(webglFunc)"));
    assert!(!html.contains("//__insertGLOptimize"));
    assert!(html.contains("gl[3](gl[2](p, 'zb'), 1, 2);"));
    assert!(html.contains("img.src = 'a';"));
    assert!(html.contains("let song = [[],1,,,];"));
    assert!(html.contains("gl[1](4, 0, 3);"));
    assert!(html.ends_with("</script></html>"));

    // Constants reach the compressor as global definitions instead of declarations
    assert_eq!(fs::read_to_string(build.join("shared.js")).unwrap(), "let $0 = () => SPEED;");
    assert_eq!(fs::read_to_string(build.join("server.js")).unwrap(), "$0();");
    assert_eq!(fs::read_to_string(build.join("a")).unwrap(), "ico");
    assert!(!build.join("favicon.ico").exists());

    let archive = dir.path().join("bundle.zip");
    assert_eq!(report.bytes, fs::metadata(&archive).unwrap().len());
    assert_eq!(report.budget, 100000);
    assert!(!report.over_budget());
}

#[test]
fn test_empty_compressor_output_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    create_project(dir.path());
    write(dir.path(), "tools/js_minifier.sh", "exit 0\n");

    let manifest = Manifest::discover(dir.path()).unwrap();
    let err = tinypack_build::run(&manifest, BuildMode::Minified).unwrap_err();
    assert!(matches!(err, PackError::MinifierOutput { ref bundle } if bundle == "client.js"));
    assert!(!dir.path().join("build").exists());
}

#[test]
fn test_failing_compressor_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    create_project(dir.path());
    write(dir.path(), "tools/js_minifier.sh", "echo 'Unexpected token' >&2\nexit 2\n");

    let manifest = Manifest::discover(dir.path()).unwrap();
    let err = tinypack_build::run(&manifest, BuildMode::Minified).unwrap_err();
    assert!(matches!(err, PackError::ToolFailed { ref stderr, .. } if stderr == "Unexpected token"));
    assert!(!dir.path().join("build").exists());
}

#[test]
fn test_shader_name_exhaustion_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    create_project(dir.path());
    fs::remove_dir_all(dir.path().join("shaders")).unwrap();
    let uniforms: String = (0..27).map(|i| format!("uniform float u_v{i};")).collect();
    write(dir.path(), "shaders/many.frag", &uniforms);

    let manifest = Manifest::discover(dir.path()).unwrap();
    let err = tinypack_build::run(&manifest, BuildMode::Minified).unwrap_err();
    assert!(matches!(err, PackError::NamePoolExhausted { pool: "shader", requested: 27, available: 26 }));
    assert!(!dir.path().join("build").exists());
    assert!(!dir.path().join("bundle.zip").exists());
}
