use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Test fixture providing isolated filesystem environment.
pub struct UnitTestFixture {
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
}

impl Default for UnitTestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitTestFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().to_path_buf();

        println!("[FIXTURE] Created temp directory: {data_path:?}");

        Self {
            temp_dir,
            data_path,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.data_path
    }

    /// Create a test file with content.
    #[must_use]
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.data_path.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        println!(
            "[FIXTURE] Created file: {:?} ({} bytes)",
            full_path,
            content.len()
        );
        full_path
    }

    /// Create `commands/<name>.md`; nested names create subdirectories.
    #[must_use]
    pub fn create_command(&self, name: &str, description: &str) -> PathBuf {
        self.create_file(
            &format!("commands/{name}.md"),
            &format!("---\ndescription: {description}\n---\n\n# {name}\n"),
        )
    }

    /// Create `skills/<name>/SKILL.md` and return the manifest path.
    #[must_use]
    pub fn create_skill(&self, name: &str, description: &str) -> PathBuf {
        self.create_file(
            &format!("skills/{name}/SKILL.md"),
            &format!("---\nname: {name}\ndescription: {description}\n---\n\n# {name}\n"),
        )
    }

    #[must_use]
    pub fn create_agent(&self, name: &str, description: &str) -> PathBuf {
        self.create_file(
            &format!("agents/{name}.md"),
            &format!("---\ndescription: {description}\n---\n\nYou are {name}.\n"),
        )
    }

    #[must_use]
    pub fn create_package(&self, name: &str, description: &str, members: &[&str]) -> PathBuf {
        let body = serde_json::json!({
            "name": name,
            "description": description,
            "resources": members,
        });
        self.create_file(
            &format!("packages/{name}.package.json"),
            &serde_json::to_string_pretty(&body).expect("serialize package"),
        )
    }
}

impl Drop for UnitTestFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.data_path);
    }
}
