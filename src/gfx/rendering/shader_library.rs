//! WGSL sources read from disk at startup

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader source '{}' could not be read", path.display())]
    Missing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader '{name}' failed to compile: {message}")]
    Compile { name: String, message: String },

    #[error("pipeline '{pipeline}' could not be created: {message}")]
    Link { pipeline: String, message: String },
}

/// Shader module names, each stored as `<name>.wgsl`
pub const GBUFFER: &str = "gbuffer";
pub const SHADOW: &str = "shadow";
pub const SKYBOX: &str = "skybox";
pub const COMPOSITE: &str = "composite0";
pub const DEBUG: &str = "debug";

pub const ALL_SHADERS: [&str; 5] = [GBUFFER, SHADOW, SKYBOX, COMPOSITE, DEBUG];

/// Source text of every shader, keyed by module name
#[derive(Debug, Default, Clone)]
pub struct ShaderLibrary {
    sources: BTreeMap<String, String>,
}

impl ShaderLibrary {
    /// Reads `<dir>/<name>.wgsl` for every name
    pub fn load(dir: &Path, names: &[&str]) -> Result<Self, ShaderError> {
        let mut library = Self::default();
        for name in names {
            let path = dir.join(format!("{name}.wgsl"));
            let source = std::fs::read_to_string(&path)
                .map_err(|source| ShaderError::Missing { path: path.clone(), source })?;
            log::debug!("read shader {} ({} bytes)", path.display(), source.len());
            library.insert(name, source);
        }
        Ok(library)
    }

    pub fn insert(&mut self, name: &str, source: String) {
        self.sources.insert(name.to_owned(), source);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.sources.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sources.iter().map(|(name, source)| (name.as_str(), source.as_str()))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_shader_names_the_path() {
        let dir = std::env::temp_dir().join("deferred-renderer-no-shaders");
        let err = ShaderLibrary::load(&dir, &[GBUFFER]).unwrap_err();
        match err {
            ShaderError::Missing { path, .. } => assert_eq!(path, dir.join("gbuffer.wgsl")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_loads_every_requested_source() {
        let dir = std::env::temp_dir().join(format!("deferred-renderer-shaders-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("shadow.wgsl"), "// shadow").unwrap();
        std::fs::write(dir.join("debug.wgsl"), "// debug").unwrap();

        let library = ShaderLibrary::load(&dir, &[SHADOW, DEBUG]).unwrap();
        assert_eq!(library.len(), 2);
        assert_eq!(library.get(SHADOW), Some("// shadow"));
        assert!(library.get(GBUFFER).is_none());
    }

    #[test]
    fn test_bundled_shaders_are_present() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders");
        let library = ShaderLibrary::load(&dir, &ALL_SHADERS).unwrap();
        assert_eq!(library.len(), ALL_SHADERS.len());
    }
}
