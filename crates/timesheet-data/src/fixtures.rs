//! In-memory workbook and archive builders shared by the unit tests.

use std::io::{Cursor, Write};

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

/// A fixture cell.
pub enum Fx {
    S(&'static str),
    N(f64),
    /// A native date cell formatted `yyyy-mm-dd`.
    D(u16, u8, u8),
    Blank,
}

/// Build a single-sheet XLSX workbook from `rows`.
pub fn xlsx(rows: &[Vec<Fx>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32, c as u16);
            match cell {
                Fx::S(s) => {
                    sheet.write_string(r, c, *s).expect("write string");
                }
                Fx::N(n) => {
                    sheet.write_number(r, c, *n).expect("write number");
                }
                Fx::D(y, m, d) => {
                    let date = ExcelDateTime::from_ymd(*y, *m, *d).expect("valid date");
                    sheet
                        .write_datetime_with_format(r, c, &date, &date_format)
                        .expect("write date");
                }
                Fx::Blank => {}
            }
        }
    }
    workbook.save_to_buffer().expect("save workbook")
}

/// Build a ZIP archive holding `entries` in order.
pub fn zip_archive(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    zip_archive_with(entries, CompressionMethod::Deflated)
}

/// Like [`zip_archive`] but without compression, so payload bytes can be
/// located (and corrupted) in the output.
pub fn zip_archive_stored(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    zip_archive_with(entries, CompressionMethod::Stored)
}

fn zip_archive_with(entries: &[(&str, Vec<u8>)], method: CompressionMethod) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = SimpleFileOptions::default().compression_method(method);
        for (name, data) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, options).expect("add directory");
            } else {
                zip.start_file(*name, options).expect("start file");
                zip.write_all(data).expect("write entry");
            }
        }
        zip.finish().expect("finish zip");
    }
    buf
}
