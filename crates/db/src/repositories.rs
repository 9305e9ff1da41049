pub mod jadwal;
pub mod jam_pelajaran;
pub mod refs;
