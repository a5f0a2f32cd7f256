use metaed_core::EntityRepository;

use super::config::MetaEdConfiguration;
use crate::{Error, Result};

/// Applies project metadata to namespaces and links extensions to the core.
///
/// Every extension namespace gets a dependency on the first core namespace.
/// Namespaces without a project entry keep their current metadata.
pub fn initialize_namespaces(
    repository: &mut EntityRepository,
    config: &MetaEdConfiguration,
) -> Result<()> {
    for project in &config.projects {
        let Some(namespace) = repository.namespace_mut(&project.namespace_name) else {
            return Err(Error::UnknownProjectNamespace {
                project: project.project_name.clone(),
                namespace: project.namespace_name.clone(),
            });
        };
        namespace.project_name.clone_from(&project.project_name);
        namespace.project_version.clone_from(&project.project_version);
        namespace.project_extension.clone_from(&project.project_extension);
        namespace.description.clone_from(&project.description);
        namespace.is_extension = project.is_extension();
    }

    let core = repository
        .namespaces()
        .find(|namespace| !namespace.is_extension)
        .map(|namespace| namespace.name.clone());

    let Some(core) = core else {
        let extensions: Vec<String> = repository
            .namespaces()
            .map(|namespace| namespace.name.clone())
            .collect();
        if extensions.is_empty() {
            return Ok(());
        }
        return Err(Error::MissingCoreNamespace(extensions));
    };

    for namespace in repository.namespaces_mut() {
        if namespace.is_extension && !namespace.dependencies.contains(&core) {
            tracing::debug!(namespace = %namespace.name, core = %core, "linking extension namespace");
            namespace.dependencies.push(core.clone());
        }
    }
    Ok(())
}
