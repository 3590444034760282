//! `buildmatrix reference` command

use anyhow::Result;

use buildmatrix::resolve_coordinate;

use crate::cli::{GlobalArgs, ReferenceArgs};

pub fn execute(args: ReferenceArgs, global: &GlobalArgs) -> Result<i32> {
    let ctx = super::context(global)?;
    let config = super::packager_config(&ctx, &args.packager)?;

    let coordinate = resolve_coordinate(&config)?;

    if args.full {
        println!("{}", coordinate.full_reference());
    } else {
        println!("{}", coordinate.reference());
    }

    Ok(0)
}
