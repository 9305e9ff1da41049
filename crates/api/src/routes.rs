pub mod health;
pub mod jadwal;
pub mod jam_pelajaran;
