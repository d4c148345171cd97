//! Encoding, digest and clock functions

use crate::eval::Engine;
use crate::world::World;

use super::{FunCall, FunDef};

impl<W: World> Engine<W> {
    pub(super) fn encoding_functions() -> Vec<FunDef<W>> {
        vec![
            FunDef::new("ENCODE64", 1, 1, Self::fun_encode64),
            FunDef::new("DECODE64", 1, 1, Self::fun_decode64),
            FunDef::new("DIGEST", 2, 2, Self::fun_digest),
            FunDef::new("SECS", 0, 0, Self::fun_secs),
            FunDef::new("TIME", 0, 0, Self::fun_time),
        ]
    }

    fn fun_encode64(&mut self, out: &mut String, call: &FunCall<'_>) {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        out.push_str(&STANDARD.encode(call.arg(0)));
    }

    fn fun_decode64(&mut self, out: &mut String, call: &FunCall<'_>) {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        match STANDARD.decode(call.arg(0).trim()) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => out.push_str(&text),
                Err(_) => out.push_str("#-1 INVALID DATA"),
            },
            Err(_) => out.push_str("#-1 INVALID BASE64 STRING"),
        }
    }

    /// `digest(algorithm, text)` as lower-case hex
    fn fun_digest(&mut self, out: &mut String, call: &FunCall<'_>) {
        use sha2::{Digest, Sha256, Sha512};
        let text = call.arg(1).as_bytes();
        match call.arg(0).trim().to_ascii_lowercase().as_str() {
            "sha256" => out.push_str(&hex::encode(Sha256::digest(text))),
            "sha512" => out.push_str(&hex::encode(Sha512::digest(text))),
            _ => out.push_str("#-1 UNSUPPORTED DIGEST TYPE"),
        }
    }

    fn fun_secs(&mut self, out: &mut String, _call: &FunCall<'_>) {
        out.push_str(&chrono::Utc::now().timestamp().to_string());
    }

    /// Local time, e.g. `Sun Oct 18 14:02:11 2026`
    fn fun_time(&mut self, out: &mut String, _call: &FunCall<'_>) {
        out.push_str(&chrono::Local::now().format("%a %b %d %H:%M:%S %Y").to_string());
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::dbref::Dbref;
    use crate::eval::Engine;
    use crate::world::memory::MemoryWorld;

    #[test]
    fn base64_and_digest() {
        let mut engine = Engine::new(MemoryWorld::new(), Config::default());
        assert_eq!(engine.evaluate(Dbref::GOD, "encode64(hello)"), "aGVsbG8=");
        assert_eq!(engine.evaluate(Dbref::GOD, "decode64(aGVsbG8=)"), "hello");
        assert_eq!(engine.evaluate(Dbref::GOD, "decode64(!!)"), "#-1 INVALID BASE64 STRING");
        assert_eq!(
            engine.evaluate(Dbref::GOD, "digest(sha256,abc)"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(engine.evaluate(Dbref::GOD, "digest(md4,abc)"), "#-1 UNSUPPORTED DIGEST TYPE");
    }

    #[test]
    fn clock() {
        let mut engine = Engine::new(MemoryWorld::new(), Config::default());
        let secs: i64 = engine.evaluate(Dbref::GOD, "secs()").parse().unwrap();
        assert!(secs > 1_600_000_000);
    }
}
