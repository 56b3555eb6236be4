use std::io::Write;

use super::model::PreparedTable;

/// Serialize the filtered view to CSV: UTF-8, header row, one line per
/// record, columns named as in the source dataset.
pub fn write_csv<W: Write>(
    table: &PreparedTable,
    indices: &[usize],
    writer: W,
) -> csv::Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    for &i in indices {
        w.serialize(&table.records[i])?;
    }
    w.flush()?;
    Ok(())
}

/// The CSV snapshot as bytes, ready to hand to a download action.
pub fn to_csv_bytes(table: &PreparedTable, indices: &[usize]) -> csv::Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(table, indices, &mut buf)?;
    Ok(buf)
}
