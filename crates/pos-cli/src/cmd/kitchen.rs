use crate::output::{or_dash, print_json, Table};
use clap::Subcommand;
use pos_core::kitchen::{KitchenBoard, Order};
use pos_core::paths;
use std::path::Path;

#[derive(Subcommand)]
pub enum KitchenSubcommand {
    /// List kitchen orders (open only unless --all)
    List {
        #[arg(long)]
        all: bool,
    },
}

pub fn run(root: &Path, subcmd: KitchenSubcommand, json: bool) -> anyhow::Result<()> {
    let board = KitchenBoard::load(&paths::kitchen_path(root))?;
    match subcmd {
        KitchenSubcommand::List { all } => {
            let orders: Vec<&Order> = if all {
                board.orders().iter().collect()
            } else {
                board.open_orders().collect()
            };
            if json {
                return print_json(&orders);
            }
            if orders.is_empty() {
                println!("No kitchen orders.");
                return Ok(());
            }
            let mut table = Table::new(&["ID", "TABLE", "TYPE", "STATUS", "READY", "PLACED"]);
            for o in &orders {
                let ready = o.items.iter().filter(|i| i.status.is_ready_or_later()).count();
                table.row([
                    o.id.clone(),
                    or_dash(o.table_number.as_deref()),
                    o.order_type.to_string(),
                    o.status.to_string(),
                    format!("{ready}/{}", o.items.len()),
                    o.order_time.format("%H:%M").to_string(),
                ]);
            }
            table.print();
        }
    }
    Ok(())
}
