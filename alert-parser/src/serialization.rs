use std::io::Write;

use csv::WriterBuilder;

use crate::error::ExtractError;
use crate::model::ParsedTransaction;

const CSV_HEADERS: [&str; 7] = ["id", "id_api", "template_used", "account", "vendor", "amount", "date"];

/// One JSON object per line
pub fn write_json_lines<W: Write>(transactions: &[ParsedTransaction], mut writer: W) -> Result<(), ExtractError> {
    for tx in transactions {
        serde_json::to_writer(&mut writer, tx)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// CSV with a header row; absent optional fields are empty cells
pub fn write_csv<W: Write>(transactions: &[ParsedTransaction], writer: W) -> Result<(), ExtractError> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);

    wtr.write_record(CSV_HEADERS)?;

    for tx in transactions {
        let amount = format!("{:.2}", tx.amount);
        wtr.write_record([
            tx.id.as_deref().unwrap_or_default(),
            tx.id_api.as_str(),
            tx.template_used.as_str(),
            tx.account.as_deref().unwrap_or_default(),
            tx.vendor.as_deref().unwrap_or_default(),
            amount.as_str(),
            tx.date.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
