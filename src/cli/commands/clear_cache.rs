//! Clear-cache command - drop every cached response

use crate::cache::DiskCache;
use crate::cli::args::ClearCacheArgs;
use crate::config::{Config, ConfigManager};
use crate::error::AwsmapResult;
use crate::ui::{self, UiContext};

/// Execute the clear-cache command
pub async fn execute(args: ClearCacheArgs, config: &Config, dry_run: bool) -> AwsmapResult<()> {
    let ctx = UiContext::detect()
        .with_auto_yes(args.yes)
        .with_dry_run(dry_run);
    clear(&ctx, &DiskCache::new(ConfigManager::cache_dir(config))).await
}

async fn clear(ctx: &UiContext, cache: &DiskCache) -> AwsmapResult<()> {
    let root = cache.root().display().to_string();

    if ctx.dry_run() {
        ui::step_info(ctx, &format!("Would clear {}", root));
        return Ok(());
    }

    // Interactive terminals confirm; scripts and -y go straight through
    let default = !ctx.is_interactive();
    if !ui::confirm(ctx, &format!("Delete all cached responses in {}?", root), default).await? {
        ui::remark(ctx, "Cache left untouched");
        return Ok(());
    }

    let removed = cache.clear().await?;
    ui::step_ok_detail(ctx, "Cache cleared", &format!("{} entries from {}", removed, root));
    Ok(())
}
