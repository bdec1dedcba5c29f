//! `combine`: re-run a merge by hand.

use anyhow::Context;
use courtbatch_opendal::{Location, Storage};

use crate::config::CombineArgs;

pub async fn execute(storage: &Storage, args: &CombineArgs) -> anyhow::Result<()> {
    let location = Location::parse(&args.chunks_dir)?;
    let (backend, key) = storage.resolve(&location)?;

    let artifacts = courtbatch_runtime::combine(backend, args.flavor, &key)
        .await
        .with_context(|| format!("failed to combine '{location}'"))?;

    super::print_report(&artifacts)
}
