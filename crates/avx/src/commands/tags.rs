//! Resource tag command handlers.

use std::collections::HashMap;

use serde::Serialize;
use tabled::Tabled;

use avx_core::{ControllerClient, ResourceRef, ResourceTags};

use crate::cli::{GlobalOpts, ResourceArgs, TagsArgs, TagsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct TagEntry {
    key: String,
    value: String,
}

#[derive(Tabled)]
struct TagRow<'a> {
    #[tabled(rename = "Key")]
    key: &'a str,
    #[tabled(rename = "Value")]
    value: &'a str,
}

fn entries(tags: HashMap<String, String>) -> Vec<TagEntry> {
    let mut entries: Vec<TagEntry> = tags
        .into_iter()
        .map(|(key, value)| TagEntry { key, value })
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    entries
}

fn resource_ref(args: &ResourceArgs) -> Result<ResourceRef, CliError> {
    Ok(ResourceRef::new(
        util::parse_cloud_type(&args.cloud_type)?,
        &args.resource_type,
        &args.resource_name,
    ))
}

/// Collect repeated `--tag` pairs; a later duplicate key wins.
fn tag_map(pairs: Vec<(String, String)>) -> HashMap<String, String> {
    pairs.into_iter().collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &ControllerClient,
    args: TagsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let tags = ResourceTags::new(client);

    match args.command {
        TagsCommand::List(resource) => {
            let resource = resource_ref(&resource)?;
            let current = tags.read(&resource).await?.unwrap_or_default();
            let data = entries(current);
            let out = output::render_list(
                &global.output,
                &data,
                |e| TagRow {
                    key: &e.key,
                    value: &e.value,
                },
                |e| format!("{}={}", e.key, e.value),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TagsCommand::Add {
            resource,
            tags: pairs,
        } => {
            let resource = resource_ref(&resource)?;
            let desired = tag_map(pairs);
            let count = desired.len();
            tags.create(&resource, desired).await?;
            output::status(&format!("Added {count} tag(s) to {resource}"), global.quiet);
            Ok(())
        }

        TagsCommand::Update {
            resource,
            tags: pairs,
        } => {
            let resource = resource_ref(&resource)?;
            let desired = tag_map(pairs);
            if desired.is_empty()
                && !util::confirm(
                    &format!("Remove every user tag from {resource}?"),
                    "tags update",
                    global.yes,
                )?
            {
                return Ok(());
            }
            let count = desired.len();
            tags.update(&resource, desired).await?;
            output::status(
                &format!("Replaced tags on {resource} ({count} tag(s))"),
                global.quiet,
            );
            Ok(())
        }

        TagsCommand::Delete {
            resource,
            keys,
            all,
        } => {
            let resource = resource_ref(&resource)?;
            if all {
                if !util::confirm(
                    &format!("Remove every user tag from {resource}?"),
                    "tags delete --all",
                    global.yes,
                )? {
                    return Ok(());
                }
                tags.delete(&resource).await?;
                output::status(&format!("Removed all tags from {resource}"), global.quiet);
            } else {
                tags.delete_keys(&resource, &keys).await?;
                output::status(
                    &format!("Removed {} from {resource}", keys.join(", ")),
                    global.quiet,
                );
            }
            Ok(())
        }
    }
}
