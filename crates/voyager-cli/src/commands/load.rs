//! Load command implementation.

use anyhow::Result;
use voyager_core::TypeKind;
use voyager_ops::Config;

use super::{load_context, SourceArgs};

/// Load a schema and print a summary of it.
pub async fn execute(config: &Config, source: &SourceArgs) -> Result<()> {
    let ctx = load_context(config, source).await?;
    let state = ctx.session().snapshot();

    if let Some(schema) = &state.schema {
        let types: Vec<_> = schema
            .types()
            .iter()
            .filter(|t| !t.is_introspection_type())
            .collect();
        let count = |kind: TypeKind| types.iter().filter(|t| t.kind == kind).count();

        println!("📊 Schema loaded");
        println!("{:─<50}", "");
        println!("🌱 Root type:   {}", schema.root_type_name());
        if let Some(preset) = &state.active_preset {
            println!("📦 Preset:      {}", preset);
        }
        println!("🔢 Types:       {}", types.len());
        println!("   objects:     {}", count(TypeKind::Object));
        println!("   interfaces:  {}", count(TypeKind::Interface));
        println!("   unions:      {}", count(TypeKind::Union));
        println!("   enums:       {}", count(TypeKind::Enum));
        println!("   inputs:      {}", count(TypeKind::InputObject));
        println!("   scalars:     {}", count(TypeKind::Scalar));
    }

    ctx.shutdown().await?;
    Ok(())
}
