/// `count` evenly spaced values from `start` to `stop`, both ends included
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (stop - start) / ((count - 1) as f64);
            (0..count)
                .map(|index| if index == count - 1 { stop } else { start + step * index as f64 })
                .collect()
        }
    }
}

pub fn env_is_set(name: &str) -> bool {
    match std::env::var(name) {
        Ok(value) => !value.is_empty(),
        Err(_) => false,
    }
}
