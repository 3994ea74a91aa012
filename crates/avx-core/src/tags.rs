// ── Resource tag lifecycle ──
//
// Declarative tag management for one resource: the desired mapping is
// applied with add/update, and "no tags" is reached by deleting whatever
// keys the controller currently reports.

use std::collections::HashMap;

use tracing::{debug, info};

use avx_api::{CloudType, ControllerClient, TagClient, TagSet};

use crate::error::CoreError;

/// Identity of a taggable cloud resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub cloud_type: CloudType,
    pub resource_type: String,
    pub resource_name: String,
}

impl ResourceRef {
    pub fn new(
        cloud_type: CloudType,
        resource_type: impl Into<String>,
        resource_name: impl Into<String>,
    ) -> Self {
        Self {
            cloud_type,
            resource_type: resource_type.into(),
            resource_name: resource_name.into(),
        }
    }

    fn tag_set(&self) -> TagSet {
        TagSet::new(self.cloud_type, &self.resource_type, &self.resource_name)
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.resource_type.trim().is_empty() || self.resource_name.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "resource_type and resource_name must not be empty".into(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.cloud_type, self.resource_type, self.resource_name
        )
    }
}

fn validate_tags(tags: &HashMap<String, String>) -> Result<(), CoreError> {
    if tags.keys().any(|k| k.trim().is_empty()) {
        return Err(CoreError::ValidationFailed {
            message: "tag keys must not be empty".into(),
        });
    }
    Ok(())
}

/// Create/read/update/delete of a resource's user tags.
pub struct ResourceTags<'c> {
    tags: TagClient<'c>,
}

impl<'c> ResourceTags<'c> {
    pub fn new(controller: &'c ControllerClient) -> Self {
        Self {
            tags: controller.tags(),
        }
    }

    /// Current user tags. `None` means the resource carries no user tags.
    pub async fn read(
        &self,
        resource: &ResourceRef,
    ) -> Result<Option<HashMap<String, String>>, CoreError> {
        resource.validate()?;
        let mut set = resource.tag_set();
        self.tags.list(&mut set).await?;
        debug!(%resource, count = set.tags.len(), "read resource tags");
        Ok((!set.tags.is_empty()).then_some(set.tags))
    }

    /// Attach `tags` to a resource that has none managed yet.
    pub async fn create(
        &self,
        resource: &ResourceRef,
        tags: HashMap<String, String>,
    ) -> Result<(), CoreError> {
        resource.validate()?;
        if tags.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "at least one tag is required".into(),
            });
        }
        validate_tags(&tags)?;

        let count = tags.len();
        self.tags.add(&resource.tag_set().with_tags(tags)).await?;
        info!(%resource, count, "resource tags added");
        Ok(())
    }

    /// Replace the resource's tags with `tags`.
    ///
    /// An empty mapping removes every user tag currently on the resource.
    pub async fn update(
        &self,
        resource: &ResourceRef,
        tags: HashMap<String, String>,
    ) -> Result<(), CoreError> {
        resource.validate()?;
        if tags.is_empty() {
            return self.delete(resource).await;
        }
        validate_tags(&tags)?;

        let count = tags.len();
        self.tags.update(&resource.tag_set().with_tags(tags)).await?;
        info!(%resource, count, "resource tags replaced");
        Ok(())
    }

    /// Remove every user tag from the resource.
    ///
    /// Keys are taken from a fresh list; nothing is sent when there are none.
    pub async fn delete(&self, resource: &ResourceRef) -> Result<(), CoreError> {
        let Some(current) = self.read(resource).await? else {
            debug!(%resource, "no user tags to delete");
            return Ok(());
        };
        self.delete_keys(resource, current.keys()).await
    }

    /// Remove only the named keys.
    pub async fn delete_keys<I, S>(&self, resource: &ResourceRef, keys: I) -> Result<(), CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        resource.validate()?;
        let mut keys: Vec<String> = keys.into_iter().map(|k| k.as_ref().to_owned()).collect();
        if keys.is_empty() {
            return Ok(());
        }
        keys.sort();

        let set = resource.tag_set().with_tag_list(&keys);
        self.tags.delete(&set).await?;
        info!(%resource, keys = %set.tag_list, "resource tags deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_resource() {
        let r = ResourceRef::new(CloudType::Gcp, "vpc", "net-1");
        assert_eq!(r.to_string(), "gcp/vpc/net-1");
    }

    #[test]
    fn blank_identity_is_rejected() {
        let r = ResourceRef::new(CloudType::Aws, " ", "vpc-1");
        assert!(matches!(
            r.validate(),
            Err(CoreError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn blank_tag_key_is_rejected() {
        let tags = HashMap::from([(String::new(), "v".to_owned())]);
        assert!(validate_tags(&tags).is_err());
    }
}
