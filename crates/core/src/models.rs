pub mod enums;
pub mod jadwal;
pub mod jam_pelajaran;
