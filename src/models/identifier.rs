//! Identifier model: a normalized pointer into a documentation set.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

const APPLE_IOS: &str = "com.apple.adc.documentation.iOS";
const APPLE_OSX: &str = "com.apple.adc.documentation.OSX";

/// Docset whose pages are keyed by their external source instead of their path.
const SOURCE_KEYED_DOCSET: &str = "Mono";

static DOTTED_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+\.*[0-9]+(\.*[0-9]+)*").expect("valid regex"));
static PREFIXED_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v[0-9]+\.*[0-9]+(\.*[0-9]+)*").expect("valid regex"));
static UNDERSCORE_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+_*[0-9]+(_*[0-9]+)*").expect("valid regex"));

const PRERELEASE_SEGMENTS: [&str; 18] = [
    "/-alpha/", "/-alpha./", "/-alpha-/", "/-beta/", "/-beta./", "/-beta-/", "/-rc/", "/-rc./",
    "/-rc-/", "/.alpha/", "/.alpha./", "/.alpha-/", "/.beta/", "/.beta./", "/.beta-/", "/.rc/",
    "/.rc./", "/.rc-/",
];

/// A location within a docset that entries can be attached to.
///
/// `id` and `banned_from_public` are owned by the server and never read from
/// request payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub banned_from_public: bool,
    #[serde(default)]
    pub docset_name: String,
    #[serde(default)]
    pub docset_filename: String,
    #[serde(default)]
    pub docset_platform: String,
    #[serde(default)]
    pub docset_bundle: String,
    #[serde(default)]
    pub docset_version: String,
    #[serde(default)]
    pub page_path: String,
    #[serde(default)]
    pub page_title: String,
    #[serde(default)]
    pub httrack_source: String,
}

/// The natural key an identifier is looked up by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentifierKey {
    Page {
        docset_filename: String,
        page_path: String,
    },
    Source {
        docset_filename: String,
        httrack_source: String,
    },
}

impl Identifier {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.docset_filename.trim().is_empty() {
            return Err(AppError::missing("identifier"));
        }
        Ok(())
    }

    pub fn key(&self) -> IdentifierKey {
        if self.docset_filename == SOURCE_KEYED_DOCSET && !self.httrack_source.is_empty() {
            IdentifierKey::Source {
                docset_filename: self.docset_filename.clone(),
                httrack_source: self.httrack_source.clone(),
            }
        } else {
            IdentifierKey::Page {
                docset_filename: self.docset_filename.clone(),
                page_path: self.page_path.clone(),
            }
        }
    }

    /// Strip version noise so that different releases of a docset share
    /// their annotations.
    pub fn normalized(mut self) -> Self {
        let filename = self
            .docset_filename
            .strip_suffix(".docset")
            .unwrap_or(&self.docset_filename);
        let filename = DOTTED_VERSION_RE.replace_all(filename, "");
        self.docset_filename = strip_digits(&filename).trim().to_string();
        self.normalize_apple_names();

        if self.docset_filename == "Apple_API_Reference" {
            self.httrack_source = self
                .httrack_source
                .replace("?language=objc", "")
                .replace("/ns", "/")
                .replace("https://", "");
        }

        self.page_path = normalize_page_path(&self.page_path);
        self
    }

    fn normalize_apple_names(&mut self) {
        let filename = self.docset_filename.as_str();
        if filename == "prerelease" {
            if let Some(rest) = self.page_path.strip_prefix("ios/") {
                self.page_path = rest.to_string();
                self.docset_filename = APPLE_IOS.to_string();
            } else if let Some(rest) = self.page_path.strip_prefix("mac/") {
                self.page_path = rest.to_string();
                self.docset_filename = APPLE_OSX.to_string();
            }
        } else if filename == "ios" || filename.ends_with("AppleiOS.iOSLibrary") {
            self.docset_filename = APPLE_IOS.to_string();
        } else if filename == "mac" || filename.ends_with("AppleOSX.CoreReference") {
            self.docset_filename = APPLE_OSX.to_string();
        }
    }
}

fn strip_digits(value: &str) -> String {
    value.chars().filter(|c| !c.is_ascii_digit()).collect()
}

fn normalize_page_path(page_path: &str) -> String {
    let path = page_path
        .replace("https://", "http://")
        .replace("swiftdoc.org/swift-2/", "swiftdoc.org/");

    let (dir, basename) = match path.rfind('/') {
        Some(idx) => path.split_at(idx + 1),
        None => ("", path.as_str()),
    };

    let mut basename = basename.to_string();
    for n in 2..=9 {
        basename = basename.replace(&format!("-{}.html", n), ".html");
    }

    let dir = PREFIXED_VERSION_RE.replace_all(dir, "");
    let dir = DOTTED_VERSION_RE.replace_all(&dir, "");
    let dir = UNDERSCORE_VERSION_RE.replace_all(&dir, "");
    let mut dir = strip_digits(&dir);
    for segment in PRERELEASE_SEGMENTS {
        dir = dir.replace(segment, "/");
    }
    let dir = dir.strip_prefix("www.").unwrap_or(&dir);
    let dir = dir.replace("//", "/");

    format!("{}{}", dir.trim(), basename)
}

/// Request body for listing the entries of an identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct ListEntriesRequest {
    #[serde(default)]
    pub identifier: Identifier,
}
