use runtime_js::Context;
use runtime_js::LanguageVersion;
use runtime_js::SealKey;

#[test]
fn sealed_context_rejects_setters() {
  let mut cx = Context::new();
  cx.seal(None);
  assert!(cx.is_sealed());
  assert!(cx.set_language_version(LanguageVersion::V1_5).is_err());
  assert!(cx.set_generating_source(false).is_err());
  assert!(cx.set_locale("de_DE").is_err());
  assert!(cx
    .put_thread_local("k", Box::new(1u32))
    .is_err());
}

#[test]
fn unseal_requires_the_identical_key() {
  let mut cx = Context::new();
  let key = SealKey::new();
  cx.seal(Some(key.clone()));
  assert!(cx.is_sealed());

  // A different key (even a fresh one) is rejected.
  let wrong = SealKey::new();
  assert!(cx.unseal(&wrong).is_err());
  assert!(cx.is_sealed());

  cx.unseal(&key).unwrap();
  assert!(!cx.is_sealed());
  assert!(cx.set_language_version(LanguageVersion::V1_5).is_ok());
}

#[test]
fn sealing_without_key_is_permanent() {
  let mut cx = Context::new();
  cx.seal(None);
  let key = SealKey::new();
  assert!(cx.unseal(&key).is_err());
  assert!(cx.is_sealed());
}

#[test]
fn unsealing_an_unsealed_context_fails() {
  let mut cx = Context::new();
  let key = SealKey::new();
  assert!(cx.unseal(&key).is_err());
}

#[test]
fn language_version_numeric_round_trip() {
  assert_eq!(
    LanguageVersion::from_number(120).unwrap(),
    LanguageVersion::V1_2
  );
  assert_eq!(LanguageVersion::V1_2.as_number(), 120);
  assert_eq!(
    LanguageVersion::from_number(250).unwrap(),
    LanguageVersion::Ecmascript
  );
  assert!(LanguageVersion::from_number(123).is_err());
}
