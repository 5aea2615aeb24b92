#![no_main]

use libfuzzer_sys::fuzz_target;
use pinpoint_ci::csv_reader::parse_csv;
use pinpoint_ci::samples::extract_samples;

fuzz_target!(|data: &[u8]| {
    // Lossy decoding matches how input files are read
    let text = String::from_utf8_lossy(data);
    if let Ok(table) = parse_csv("fuzz.csv", &text) {
        // Extraction should not panic regardless of row contents
        let samples = extract_samples(&table.rows);
        for (_, pairs) in samples.paired() {
            assert!(!pairs.is_empty());
        }
    }
});
