//! Stack-scoped resource names.

/// Build a resource name unique to a project and stack.
///
/// Names follow `{project}-{stack}-{resource}`, so the same declaration can be
/// deployed to several stacks of one project without collisions.
pub fn construct_name(project: &str, stack: &str, resource: &str) -> String {
  format!("{project}-{stack}-{resource}")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn joins_with_dashes() {
    assert_eq!(construct_name("proj", "dev", "titiler-lambda-archive"), "proj-dev-titiler-lambda-archive");
  }

  #[test]
  fn distinct_stacks_get_distinct_names() {
    assert_ne!(construct_name("proj", "dev", "db"), construct_name("proj", "prod", "db"));
  }
}
