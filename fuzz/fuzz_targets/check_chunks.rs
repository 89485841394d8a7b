#![no_main]

use coderchain::check::{available_checks, checksum};
use coderchain::Check;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let step = data[0] as usize + 1;
    let data = &data[1..];

    for kind in available_checks() {
        let mut check = Check::new(kind).unwrap();
        for chunk in data.chunks(step) {
            check.update(chunk);
        }
        check.finish();
        assert_eq!(check.digest(), checksum(kind, data).unwrap());
    }
});
