//! init command - Create a new scene document

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::config::{Config, SceneConfig};
use crate::core::types::{LayerName, SelectMode};
use crate::document::{DocumentLock, DocumentStore, SceneDocument, SceneObject};
use crate::host::MeshData;
use crate::ui::output;

/// Options for [`init`].
#[derive(Debug, Clone)]
pub struct InitOptions {
    pub grid: (usize, usize),
    pub name: String,
    pub layer: Option<String>,
    pub empty: bool,
    pub force: bool,
}

/// Create a new scene document with one active object.
pub fn init(ctx: &Context, opts: InitOptions) -> Result<()> {
    let store = DocumentStore::new(&ctx.file);
    let _lock = DocumentLock::acquire(store.path()).context("failed to lock scene document")?;

    if store.exists() && !opts.force {
        bail!(
            "{} already exists; use --force to overwrite",
            store.path().display()
        );
    }

    if let Some(layer) = &opts.layer {
        LayerName::new(layer.as_str())?;
        let path = Config::write_scene(
            store.dir(),
            &SceneConfig {
                layer: Some(layer.clone()),
                ..SceneConfig::default()
            },
        )?;
        output::debug(format!("wrote {}", path.display()), ctx.verbosity);
    }

    let object = if opts.empty {
        SceneObject::empty(opts.name.as_str())
    } else {
        let (cols, rows) = opts.grid;
        SceneObject::mesh(opts.name.as_str(), MeshData::grid(cols, rows))
    };
    let verts = object.mesh.as_ref().map_or(0, |m| m.verts.len());

    let mut doc = SceneDocument::new(SelectMode::Vertex);
    doc.add_active(object);
    store
        .save(&mut doc)
        .with_context(|| format!("failed to write {}", store.path().display()))?;

    output::success(
        format!(
            "created {} with '{}' ({} vertices)",
            store.path().display(),
            opts.name,
            verts
        ),
        ctx.verbosity,
    );
    Ok(())
}
