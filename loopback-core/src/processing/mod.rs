pub mod combiner;
pub mod normalizer;
pub mod ring_buffer;
pub mod wav_format;
