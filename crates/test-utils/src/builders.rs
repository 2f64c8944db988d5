#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use stylepipe::config::{ConfigFile, RawConfigFile, RawPathGroup, WatchRuleConfig};
use stylepipe::fs::{FileSystem, RealFileSystem};
use stylepipe::tasks::Project;
use stylepipe::types::Compatibility;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn scss(mut self, group: RawPathGroup) -> Self {
        self.config.paths.scss = group;
        self
    }

    pub fn css(mut self, group: RawPathGroup) -> Self {
        self.config.paths.css = group;
        self
    }

    pub fn entry(mut self, file: &str) -> Self {
        self.config.paths.scss.file = Some(file.to_string());
        self
    }

    pub fn output_file(mut self, file: &str) -> Self {
        self.config.paths.css.file = Some(file.to_string());
        self
    }

    pub fn source_maps(mut self, val: bool) -> Self {
        self.config.sass.source_maps = val;
        self
    }

    pub fn load_path(mut self, dir: &str) -> Self {
        self.config.sass.load_paths.push(dir.to_string());
        self
    }

    pub fn preserve_important(mut self, val: bool) -> Self {
        self.config.clean.preserve_important = val;
        self
    }

    pub fn compatibility(mut self, compat: Compatibility) -> Self {
        self.config.minify.compatibility = compat;
        self
    }

    pub fn sequence(mut self, name: &str, steps: &[&str]) -> Self {
        self.config.sequence.insert(
            name.to_string(),
            steps.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn watch(mut self, pattern: &str, tasks: &[&str]) -> Self {
        self.config
            .watch
            .get_or_insert_with(Vec::new)
            .push(WatchRuleConfig {
                pattern: pattern.to_string(),
                tasks: tasks.iter().map(|s| s.to_string()).collect(),
            });
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A throwaway project directory on disk.
pub struct TempProject {
    dir: tempfile::TempDir,
}

impl TempProject {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp project dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> &Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write project file");
        self
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).expect("read project file")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Files directly inside `rel_dir`, sorted by name.
    pub fn list(&self, rel_dir: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path(rel_dir))
            .map(|rd| {
                rd.filter_map(|e| e.ok())
                    .filter(|e| e.path().is_file())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn project(&self, config: ConfigFile) -> Arc<Project> {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        Arc::new(Project::new(self.root(), fs, config))
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}
