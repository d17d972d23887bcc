use std::path::Path;

use serde::Deserialize;

use doctest::session::SessionSyntax;

/// Optional `doctest.toml` configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Prompt marker override (default `sage:`).
    #[serde(default)]
    pub prompt: Option<String>,

    /// Continuation marker override (default `....:`).
    #[serde(default)]
    pub continuation: Option<String>,

    /// Default section filter applied when `--section` is not given.
    #[serde(default)]
    pub sections: Vec<String>,
}

impl Config {
    /// Load from an explicit path, or from `doctest.toml` in the working
    /// directory when present. No file means defaults.
    pub fn load(explicit: Option<&str>) -> Result<Config, String> {
        let path = match explicit {
            Some(p) => Path::new(p).to_path_buf(),
            None => {
                let local = Path::new("doctest.toml");
                if !local.exists() {
                    return Ok(Config::default());
                }
                local.to_path_buf()
            }
        };
        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn syntax(&self) -> SessionSyntax {
        let mut syntax = SessionSyntax::default();
        if let Some(prompt) = &self.prompt {
            syntax.prompt = prompt.clone();
        }
        if let Some(continuation) = &self.continuation {
            syntax.continuation = continuation.clone();
        }
        syntax
    }
}
