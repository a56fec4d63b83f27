use std::path::Path;

use super::{Candidate, Discovered, DiscoveryError, search_root};
use crate::resource::ResourceType;
use crate::resource::package::PACKAGE_SUFFIX;

/// Packages live only in `<search root>/packages/*.package.json`.
pub fn discover_packages(source_dir: &Path, subpath: Option<&str>) -> Discovered {
    let root = match search_root(source_dir, subpath) {
        Ok(root) => root,
        Err(err) => {
            return Discovered {
                errors: vec![err],
                ..Discovered::default()
            };
        }
    };

    let mut found = Discovered::default();
    let dir = root.join(ResourceType::Package.dir_name());
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return found;
    };
    let mut paths: Vec<_> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(PACKAGE_SUFFIX))
        })
        .collect();
    paths.sort();

    for path in paths {
        match ResourceType::Package.kind().load(&path) {
            Ok(resource) => found.candidates.push(Candidate {
                resource_type: ResourceType::Package,
                name: resource.name,
                path,
            }),
            Err(err) => found.errors.push(DiscoveryError::new(&path, err)),
        }
    }
    found.dedupe()
}
