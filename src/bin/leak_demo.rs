//! Leak fixture: allocates a heap buffer and never releases it.
//!
//! Expected finding: one unreleased heap allocation of 40 bytes
//! (10 x 4-byte integers) at the allocation line in `cause_memory_leak`.

fn cause_memory_leak() {
    let data = Box::into_raw(Box::new([0i32; 10]));

    // The raw pointer is dropped without a matching Box::from_raw, so the
    // buffer stays live after this frame is gone.
    unsafe {
        (*data)[0] = 42;
        println!("Allocated data[0] = {}", (*data)[0]);
    }
}

fn main() {
    println!("Starting memory leak test...");
    cause_memory_leak();
    println!("Test finished.");
}
