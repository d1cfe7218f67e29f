//! `hdi schema` - JSON schema of the cluster document

use schemars::schema_for;

use hdi_common::ClusterSpec;

use crate::Result;

pub fn run() -> Result<()> {
    let schema = schema_for!(ClusterSpec);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
