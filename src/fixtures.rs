#[cfg(test)]
pub mod test {
    use std::fs;
    use std::path::{Path, PathBuf};

    use tempfile::TempDir;
    use toml::Table;

    pub fn table(toml_str: &str) -> Table {
        toml_str.parse::<Table>().unwrap()
    }

    /// A scratch directory for config files. Removed on drop.
    pub struct TempTree {
        dir: TempDir,
    }

    impl TempTree {
        pub fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        pub fn path(&self) -> &Path {
            self.dir.path()
        }

        /// Write `content` to `relative`, creating parent directories.
        pub fn write(&self, relative: &str, content: &str) -> PathBuf {
            let path = self.dir.path().join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, content).unwrap();
            path
        }
    }

    #[test]
    fn write_creates_parents() {
        let tmp = TempTree::new();
        let path = tmp.write("a/b/c.toml", "x = 1");
        assert!(path.starts_with(tmp.path()));
        assert_eq!(fs::read_to_string(path).unwrap(), "x = 1");
    }
}
