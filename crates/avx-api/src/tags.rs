// Resource tag endpoints
//
// Add, list, delete, and replace the user tags of one cloud resource.
// The controller owns merge/replace semantics; nothing here diffs.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::{CloudType, TagResults, TagSet};

pub const ADD_TAGS_ACTION: &str = "add_resource_tags";
pub const LIST_TAGS_ACTION: &str = "list_resource_tags";
pub const DELETE_TAGS_ACTION: &str = "delete_resource_tag";
pub const UPDATE_TAGS_ACTION: &str = "update_resource_tags";

/// Body of add/update: the whole tag set.
#[derive(Serialize)]
struct TagForm<'a> {
    cloud_type: CloudType,
    resource_type: &'a str,
    resource_name: &'a str,
    #[serde(rename = "new_tag_list", skip_serializing_if = "str::is_empty")]
    tag_list: &'a str,
    #[serde(rename = "new_tag_json", skip_serializing_if = "str::is_empty")]
    tag_json: &'a str,
}

impl<'a> From<&'a TagSet> for TagForm<'a> {
    fn from(tags: &'a TagSet) -> Self {
        Self {
            cloud_type: tags.cloud_type,
            resource_type: &tags.resource_type,
            resource_name: &tags.resource_name,
            tag_list: &tags.tag_list,
            tag_json: &tags.tag_json,
        }
    }
}

/// Identifies the resource for list.
#[derive(Serialize)]
struct ResourceQuery<'a> {
    cloud_type: String,
    resource_type: &'a str,
    resource_name: &'a str,
}

#[derive(Serialize)]
struct DeleteForm<'a> {
    cloud_type: CloudType,
    del_tag_list: &'a str,
    resource_name: &'a str,
    resource_type: &'a str,
}

/// Tag operations against one controller session.
pub struct TagClient<'c> {
    controller: &'c ControllerClient,
}

impl<'c> TagClient<'c> {
    pub fn new(controller: &'c ControllerClient) -> Self {
        Self { controller }
    }

    /// Attach tags to a resource.
    ///
    /// `POST action=add_resource_tags` with `new_tag_json` (and `new_tag_list` if set).
    pub async fn add(&self, tags: &TagSet) -> Result<(), Error> {
        debug!(
            resource = %tags.resource_name,
            count = tags.tags.len(),
            "adding resource tags"
        );
        self.controller
            .post(ADD_TAGS_ACTION, &TagForm::from(tags))
            .await
    }

    /// List the user tags of a resource.
    ///
    /// `GET action=list_resource_tags`. Fills `tags.tags` with the `usr_tags`
    /// category and returns the same entries as `"key:value"` strings, in no
    /// particular order. A resource without user tags yields an empty list.
    pub async fn list(&self, tags: &mut TagSet) -> Result<Vec<String>, Error> {
        debug!(resource = %tags.resource_name, "listing resource tags");

        let query = ResourceQuery {
            cloud_type: tags.cloud_type.code().to_string(),
            resource_type: &tags.resource_type,
            resource_name: &tags.resource_name,
        };
        let results: Option<TagResults> = self.controller.get(LIST_TAGS_ACTION, &query).await?;

        let Some(user_tags) = results.and_then(|r| r.user_tags) else {
            return Ok(Vec::new());
        };

        let list = tag_strings(&user_tags);
        tags.tags = user_tags;
        Ok(list)
    }

    /// Remove the tags named in `tags.tag_list`.
    ///
    /// `POST action=delete_resource_tag` with `del_tag_list`.
    pub async fn delete(&self, tags: &TagSet) -> Result<(), Error> {
        debug!(
            resource = %tags.resource_name,
            del_tag_list = %tags.tag_list,
            "deleting resource tags"
        );
        let form = DeleteForm {
            cloud_type: tags.cloud_type,
            del_tag_list: &tags.tag_list,
            resource_name: &tags.resource_name,
            resource_type: &tags.resource_type,
        };
        self.controller.post(DELETE_TAGS_ACTION, &form).await
    }

    /// Replace the resource's tags with `tags.tag_json`.
    ///
    /// `POST action=update_resource_tags`
    pub async fn update(&self, tags: &TagSet) -> Result<(), Error> {
        debug!(
            resource = %tags.resource_name,
            count = tags.tags.len(),
            "updating resource tags"
        );
        self.controller
            .post(UPDATE_TAGS_ACTION, &TagForm::from(tags))
            .await
    }
}

fn tag_strings(tags: &HashMap<String, String>) -> Vec<String> {
    tags.iter().map(|(k, v)| format!("{k}:{v}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_strings_join_key_and_value() {
        let tags = HashMap::from([
            ("env".to_owned(), "prod".to_owned()),
            ("team".to_owned(), "net:core".to_owned()),
        ]);
        let mut list = tag_strings(&tags);
        list.sort();
        assert_eq!(list, vec!["env:prod", "team:net:core"]);
    }

    #[test]
    fn empty_optional_fields_are_not_sent() {
        let set = TagSet::new(CloudType::Azure, "vnet", "vnet-1");
        let value = serde_json::to_value(TagForm::from(&set)).unwrap_or_default();
        assert_eq!(value["cloud_type"], 8);
        assert!(value.get("new_tag_list").is_none());
        assert!(value.get("new_tag_json").is_none());
    }
}
