pub mod bulk;
pub mod import;
pub mod jadwal;
pub mod jam_pelajaran;
pub mod matrix;
