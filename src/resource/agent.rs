use std::path::Path;

use super::command::load_markdown;
use super::{Resource, ResourceKind, ResourceType, validate_common};
use crate::error::Result;

/// Agent definitions: markdown files, optionally nested.
pub struct AgentKind;

impl ResourceKind for AgentKind {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Agent
    }

    fn load(&self, path: &Path) -> Result<Resource> {
        let resource = load_markdown(path, ResourceType::Agent)?;
        self.validate(&resource)?;
        Ok(resource)
    }

    fn validate(&self, resource: &Resource) -> Result<()> {
        validate_common(resource)
    }

    fn file_name(&self, name: &str) -> String {
        format!("{name}.md")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::UnitTestFixture;

    #[test]
    fn loads_agent() {
        let fixture = UnitTestFixture::new();
        let path = fixture.create_agent("reviewer", "Reviews code");
        let resource = AgentKind.load(&path).unwrap();
        assert_eq!(resource.name, "reviewer");
        assert_eq!(resource.resource_type, ResourceType::Agent);
    }

    #[test]
    fn invalid_name_is_rejected() {
        let fixture = UnitTestFixture::new();
        let path = fixture.create_file("agents/Bad_Name.md", "---\ndescription: x\n---\n");
        assert!(AgentKind.load(&path).is_err());
    }
}
