//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }

    pub fn author() -> String {
        "<YOUR_NAME>".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn source() -> PathBuf {
        "source".into()
    }

    pub fn dest() -> PathBuf {
        "public".into()
    }

    pub fn posts() -> PathBuf {
        "_posts".into()
    }

    pub fn layouts() -> PathBuf {
        "_layouts".into()
    }

    pub mod sass {
        pub fn command() -> Vec<String> {
            vec!["sassc".into(), "--stdin".into()]
        }
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        4000
    }
}
