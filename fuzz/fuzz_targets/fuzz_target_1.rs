#![no_main]

use libfuzzer_sys::fuzz_target;
use mpeg2ts_si::descriptor::CoreDescriptors;
use mpeg2ts_si::psi::Section;

fuzz_target!(|data: &[u8]| {
    let section = match Section::from_bytes(data) {
        Ok(section) => section,
        Err(_) => return,
    };
    // exercise the Debug impls, which walk every list
    let _ = format!("{:?}", section);
    match section {
        Section::Pat(pat) => {
            for program in pat.programs().into_iter().flatten() {
                let _ = program.pid;
            }
        }
        Section::Pmt(pmt) => {
            for desc in pmt.program_info::<CoreDescriptors<'_>>().into_iter().flatten() {
                let _ = desc;
            }
            for stream in pmt.streams().into_iter().flatten().flatten() {
                for desc in stream.descriptors::<CoreDescriptors<'_>>() {
                    let _ = desc;
                }
            }
        }
        Section::Cat(cat) => {
            for desc in cat.descriptors::<CoreDescriptors<'_>>().into_iter().flatten() {
                let _ = desc;
            }
            for ca in cat.ca_descriptors().into_iter().flatten() {
                let _ = ca.private_data();
            }
        }
        Section::Ecm(ecm) => {
            let _ = ecm.data();
        }
        Section::Private(sect) => {
            let _ = sect.private_data();
        }
    }
});
