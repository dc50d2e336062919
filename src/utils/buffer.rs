use ringbuffer::{AllocRingBuffer, GrowableAllocRingBuffer, RingBuffer};

use super::capacity::Capacity;

#[derive(Debug, Clone)]
enum BufType<T> {
    Bounded(AllocRingBuffer<T>),
    Unbounded(GrowableAllocRingBuffer<T>),
}

/// Ordered buffer that either grows forever or evicts its oldest item once full.
#[derive(Debug, Clone)]
pub struct Buffer<T> {
    buf: BufType<T>,
}

impl<T> Buffer<T> {
    pub fn new(capacity: Capacity) -> Self {
        match capacity {
            Capacity::Bounded(cap) => Self {
                buf: BufType::Bounded(AllocRingBuffer::new(cap.get())),
            },
            Capacity::Unbounded => Self {
                buf: BufType::Unbounded(GrowableAllocRingBuffer::new()),
            },
        }
    }

    pub fn push(&mut self, value: T) {
        match &mut self.buf {
            BufType::Bounded(b) => b.push(value),
            BufType::Unbounded(b) => b.push(value),
        }
    }

    pub fn back(&self) -> Option<&T> {
        match &self.buf {
            BufType::Bounded(b) => b.back(),
            BufType::Unbounded(b) => b.back(),
        }
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        match &mut self.buf {
            BufType::Bounded(b) => b.back_mut(),
            BufType::Unbounded(b) => b.back_mut(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.buf {
            BufType::Bounded(b) => b.len(),
            BufType::Unbounded(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.buf {
            BufType::Bounded(b) => b.is_empty(),
            BufType::Unbounded(b) => b.is_empty(),
        }
    }
}

impl<T: Clone> Buffer<T> {
    /// Copies out the newest `n` items, oldest first
    pub fn tail(&self, n: usize) -> Vec<T> {
        let skip = self.len().saturating_sub(n);

        match &self.buf {
            BufType::Bounded(b) => b.iter().skip(skip).cloned().collect(),
            BufType::Unbounded(b) => b.iter().skip(skip).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_tail() {
        let mut buf = Buffer::<i32>::new(Capacity::Unbounded);
        assert!(buf.is_empty());
        assert_eq!(buf.tail(3), Vec::<i32>::new());

        for i in 0..100 {
            buf.push(i);
        }

        assert_eq!(buf.len(), 100);
        assert_eq!(buf.tail(3), vec![97, 98, 99]);
        assert_eq!(buf.tail(1000).len(), 100);
        assert_eq!(buf.back(), Some(&99));
    }

    #[test]
    fn test_bounded_evicts_oldest() {
        let mut buf = Buffer::<i32>::new(4usize.into());

        for i in 0..6 {
            buf.push(i);
        }

        assert_eq!(buf.len(), 4);
        assert_eq!(buf.tail(10), vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_back_mut() {
        let mut buf = Buffer::<i32>::new(2usize.into());
        assert_eq!(buf.back_mut(), None);

        buf.push(1);
        buf.push(2);
        if let Some(last) = buf.back_mut() {
            *last = 20;
        }

        assert_eq!(buf.tail(2), vec![1, 20]);
    }
}
