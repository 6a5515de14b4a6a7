//! Stack blur over a single alpha plane.
//!
//! Two separable passes (rows, then columns) of the classic stack blur: a
//! sliding triangular kernel of radius `r` kept up to date with running
//! in/out sums, so each pass is O(n) regardless of radius. Edges clamp to
//! the nearest pixel. Output is `sum / (r + 1)^2`, the kernel's total weight.

/// Blur `plane` (row major, `width * height` bytes) in place.
///
/// No-op when either dimension is below 2, the radius is 0, or the
/// plane is shorter than `width * height`.
pub fn stack_blur_alpha(plane: &mut [u8], width: usize, height: usize, radius: usize) {
    if width < 2 || height < 2 || radius == 0 || plane.len() < width * height {
        return;
    }
    let mut stack = vec![0u32; 2 * radius + 1];

    for y in 0..height {
        let row = y * width;
        blur_line(plane, row, 1, width, radius, &mut stack);
    }
    for x in 0..width {
        blur_line(plane, x, width, height, radius, &mut stack);
    }
}

/// One pass over `len` samples starting at `start`, `step` apart.
fn blur_line(plane: &mut [u8], start: usize, step: usize, len: usize, radius: usize, stack: &mut [u32]) {
    let div = stack.len();
    let r1 = radius as u64 + 1;
    let weight = r1 * r1;
    let last = len - 1;
    let at = |i: usize| start + i.min(last) * step;

    // leading half of the kernel sees the first sample repeated r + 1 times
    let first = plane[start] as u32;
    let mut sum = first as u64 * r1 * (r1 + 1) / 2;
    let mut sum_out = first as u64 * r1;
    let mut sum_in = 0u64;
    for slot in stack.iter_mut().take(radius + 1) {
        *slot = first;
    }
    for i in 1..=radius {
        let p = plane[at(i)] as u32;
        stack[radius + i] = p;
        sum += p as u64 * (r1 - i as u64);
        sum_in += p as u64;
    }

    let mut stack_in = 0;
    let mut stack_out = radius + 1;
    for i in 0..len {
        plane[start + i * step] = (sum / weight) as u8;

        sum -= sum_out;
        sum_out -= stack[stack_in] as u64;

        // lookahead sample has not been written yet: i + r + 1 > i
        let p = plane[at(i + radius + 1)] as u32;
        stack[stack_in] = p;
        sum_in += p as u64;
        sum += sum_in;
        stack_in = (stack_in + 1) % div;

        let out = stack[stack_out] as u64;
        sum_out += out;
        sum_in -= out;
        stack_out = (stack_out + 1) % div;
    }
}
