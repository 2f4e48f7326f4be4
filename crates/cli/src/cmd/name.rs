use anyhow::Result;

use stackpack_lib::config::Settings;

use crate::output::{OutputFormat, print_json};

/// Print the stack-scoped name of each resource.
pub fn cmd_name(settings: Settings, resources: &[String], format: OutputFormat) -> Result<()> {
  let config = settings.into_stack_config()?;

  if format.is_json() {
    let names: Vec<_> = resources
      .iter()
      .map(|r| serde_json::json!({ "resource": r, "name": config.resource_name(r) }))
      .collect();
    return print_json(&names);
  }

  for resource in resources {
    println!("{}", config.resource_name(resource));
  }

  Ok(())
}
