pub mod guest_book_entry;
