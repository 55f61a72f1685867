#![no_main]
use foamguard_core::{CanonicalCommand, CommandChannel, normalize};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u8, &str)| {
    let (sel, payload) = input;
    let channel = match sel % 4 {
        0 => CommandChannel::Web,
        1 => CommandChannel::Push,
        2 => CommandChannel::Bot,
        _ => CommandChannel::Console,
    };
    match normalize(channel, payload) {
        Ok(CanonicalCommand::SetThreshold(n)) => assert!(n <= 100),
        Ok(CanonicalCommand::SetReportInterval(n)) => assert!((1..=1440).contains(&n)),
        Ok(_) | Err(_) => {}
    }
});
