//! Overflow fixture: copies a 29-byte C-style string into a 10-byte stack
//! buffer with an unchecked copy, then leaks a heap buffer on the side.
//!
//! Expected findings: one out-of-bounds write in `buffer_overflow_example`
//! and one unreleased 40-byte heap allocation in `memory_leak_example`.

use std::ptr;

// 28 characters plus the terminator, against 10 bytes of capacity.
#[inline(never)]
fn buffer_overflow_example() {
    let mut buffer = [0u8; 10];
    let payload = b"ThisStringIsTooLongForBuffer\0";

    // No bounds check: writes 19 bytes past the end of `buffer`.
    unsafe {
        ptr::copy_nonoverlapping(payload.as_ptr(), buffer.as_mut_ptr(), payload.len());
    }

    std::hint::black_box(&buffer);
}

#[inline(never)]
fn memory_leak_example() {
    let ptr = Box::into_raw(Box::new([0i32; 10]));

    unsafe {
        (*ptr)[0] = 100;
    }
}

fn main() {
    println!("Starting Vulnerable Application...");

    buffer_overflow_example();
    memory_leak_example();

    println!("Finished.");
}
