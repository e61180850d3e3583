// End-to-end tests for the DocVoice Backend API
//
// Each test gets its own server on an ephemeral port, backed by the
// in-memory job store, temporary upload/audio directories and a fake
// synthesizer in place of AWS Polly. Plain-text uploads go through the real
// document extractor; PDF extraction is faked.
//
// The PostgreSQL job store test needs docker and is ignored by default:
//   cargo test -- --ignored

mod helpers;
mod test_health;
