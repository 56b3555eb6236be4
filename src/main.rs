use std::path::PathBuf;

use anyhow::Result;

use salesdash::data::{export, filter, summary};
use salesdash::state::DashboardState;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let train = PathBuf::from(args.next().unwrap_or_else(|| "data/train.csv".to_string()));
    let store = PathBuf::from(args.next().unwrap_or_else(|| "data/store.csv".to_string()));

    let mut state = DashboardState::default();
    let table = state.load(&train, &store)?;

    let selection = filter::FilterSelection::select_all(table);
    let indices = filter::filtered_indices(table, &selection);

    let ov = summary::overview(table, &indices);
    println!("prepared rows:   {}", table.len());
    println!("stores:          {}", table.stores.len());
    if let Some((lo, hi)) = table.date_bounds {
        println!("date range:      {lo} .. {hi}");
    }
    println!("total sales:     {:.2}", ov.total_sales);
    println!("mean sales:      {:.2}", ov.mean_sales);
    println!("total customers: {}", ov.total_customers);
    println!("mean customers:  {:.2}", ov.mean_customers);

    println!("\nsales by store type:");
    for (ty, sales) in summary::sales_by_store_type(table, &indices) {
        println!("  {ty}: {sales:.2}");
    }
    println!("\nsales by assortment:");
    for (a, sales) in summary::sales_by_assortment(table, &indices) {
        println!("  {a}: {sales:.2}");
    }
    println!("\ntop 5 stores by customers:");
    for (store_id, customers) in summary::top_stores_by_customers(table, &indices, 5) {
        println!("  store {store_id}: {customers}");
    }

    let csv_bytes = export::to_csv_bytes(table, &indices)?;
    println!("\nfiltered CSV snapshot: {} bytes", csv_bytes.len());

    Ok(())
}
