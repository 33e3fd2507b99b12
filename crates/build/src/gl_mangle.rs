//! Graphics context call mangling
//!
//! Client code talks to a WebGL context through `gl.<member>`. Member names are
//! long and repeated often, so minified builds rewrite them in two steps:
//! declared constants are inlined as numbers, then every remaining member access
//! becomes `gl[<ordinal>]`, where the ordinal is the member's position among all
//! declared member names in sorted order. At runtime the snippet inserted by
//! [`crate::directive::insert_gl_optimize`] installs the matching aliases.

use crate::error::{PackError, Result};
use regex::{Captures, Regex};
use serde_json::Number;
use std::collections::BTreeMap;
use std::path::Path;

/// Every known member of the graphics context, with its value when it is a constant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphicsDeclarations {
    members: BTreeMap<String, Option<Number>>,
}

impl GraphicsDeclarations {
    /// Parses a JSON object mapping member names to a number or `null`
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self { members: serde_json::from_str(json)? })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PackError::io(path, e))?;
        Self::from_json(&content).map_err(|source| PackError::Json { path: path.to_path_buf(), source })
    }

    pub fn from_members<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<Number>)>,
        S: Into<String>,
    {
        Self {
            members: members.into_iter().map(|(name, value)| (name.into(), value)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Zero-based rank of `member` among all declared names in sorted order
    pub fn ordinal(&self, member: &str) -> Option<usize> {
        self.members.keys().position(|name| name == member)
    }

    /// Value of `member` if it is declared as a constant
    pub fn constant(&self, member: &str) -> Option<&Number> {
        self.members.get(member).and_then(Option::as_ref)
    }
}

/// Rewrites member accesses on one namespace identifier
#[derive(Debug, Clone)]
pub struct GraphicsMangler<'a> {
    namespace: String,
    access: Regex,
    declarations: &'a GraphicsDeclarations,
}

impl<'a> GraphicsMangler<'a> {
    pub fn new(namespace: &str, declarations: &'a GraphicsDeclarations) -> Result<Self> {
        // The member capture is greedy, so a match always ends at a non-identifier character
        let access = Regex::new(&format!(r"\b{}\.([A-Za-z_$][A-Za-z0-9_$]*)", regex::escape(namespace)))?;
        Ok(Self {
            namespace: namespace.to_string(),
            access,
            declarations,
        })
    }

    /// Replaces every access to a declared constant with its numeric value
    pub fn inline_constants(&self, code: &str) -> String {
        self.access
            .replace_all(code, |caps: &Captures| match self.declarations.constant(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Distinct members still accessed in `code`, in order of first appearance
    pub fn referenced_members(&self, code: &str) -> Vec<String> {
        let mut members: Vec<String> = Vec::new();
        for caps in self.access.captures_iter(code) {
            if !members.iter().any(|m| m == &caps[1]) {
                members.push(caps[1].to_string());
            }
        }
        members
    }

    /// Replaces every remaining member access with an indexed access by ordinal
    ///
    /// # Errors
    /// `UnknownGraphicsMember` if a referenced member is not declared.
    pub fn mangle_calls(&self, code: &str) -> Result<String> {
        let mut ordinals = BTreeMap::new();
        for member in self.referenced_members(code) {
            let ordinal = self.declarations.ordinal(&member).ok_or_else(|| PackError::UnknownGraphicsMember(member.clone()))?;
            ordinals.insert(member, ordinal);
        }
        tracing::debug!("Indexed {} graphics members", ordinals.len());

        Ok(self
            .access
            .replace_all(code, |caps: &Captures| format!("{}[{}]", self.namespace, ordinals[&caps[1]]))
            .into_owned())
    }

    /// Inlines constants, then indexes the remaining member accesses
    pub fn mangle(&self, code: &str) -> Result<String> {
        self.mangle_calls(&self.inline_constants(code))
    }
}
