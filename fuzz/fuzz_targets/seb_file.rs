#![no_main]
use libfuzzer_sys::fuzz_target;
use sebkey::SebFile;

fuzz_target!(|data: &[u8]| {
    if let Ok(seb) = SebFile::from_bytes(data) {
        let _ = seb.config_key_for_start_url();
    }
});
