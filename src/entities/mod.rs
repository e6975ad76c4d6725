pub mod work_entry;
