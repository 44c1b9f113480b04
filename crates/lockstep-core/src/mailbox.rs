//! Inter-partition message boxes with double buffering.
//!
//! Each box pairs a front buffer (read by the consumer) with a back buffer
//! (written by the next transfer), plus a device-resident length counter.
//! The producer reserves slots in the front buffer through the atomic
//! length; [`recv_from`](MessageBox::recv_from) is enqueued on the *source*
//! partition's stream so the copy orders after the producer's work, and the
//! driver swaps front and back exactly once per superstep after a global
//! synchronize.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytemuck::Pod;
use parking_lot::Mutex;

use crate::error::Result;
use crate::stream::Stream;

/// A message addressed to a vertex local to the destination partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexMessage<M> {
    /// Local id of the receiving vertex in the destination partition.
    pub receiver: u32,
    /// User payload.
    pub value: M,
}

impl<M: Pod + Send + Sync> VertexMessage<M> {
    fn zeroed() -> Self {
        Self {
            receiver: 0,
            value: M::zeroed(),
        }
    }
}

/// Shared handle to one message buffer, as captured by kernels.
pub type MessageSlab<M> = Arc<Mutex<Box<[VertexMessage<M>]>>>;

/// Fixed-capacity single-producer single-consumer message buffer pair.
///
/// Capacity is sized by the caller to the worst-case message count, so
/// overflow is impossible by construction.
pub struct MessageBox<M: Pod + Send + Sync> {
    front: MessageSlab<M>,
    back: MessageSlab<M>,
    length: Arc<AtomicU64>,
    capacity: usize,
}

impl<M: Pod + Send + Sync> MessageBox<M> {
    /// Allocate a box with `capacity` slots in each buffer.
    pub fn new(capacity: usize) -> Self {
        let alloc =
            || Arc::new(Mutex::new(vec![VertexMessage::zeroed(); capacity].into_boxed_slice()));
        Self {
            front: alloc(),
            back: alloc(),
            length: Arc::new(AtomicU64::new(0)),
            capacity,
        }
    }

    /// Capacity of each buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current message count, read host-side.
    pub fn len(&self) -> usize {
        self.length.load(Ordering::Relaxed) as usize
    }

    /// Whether the box currently holds no messages.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Device-side handle to the front buffer.
    pub fn front(&self) -> MessageSlab<M> {
        Arc::clone(&self.front)
    }

    /// Device-side handle to the length counter.
    pub fn length_cell(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.length)
    }

    /// Enqueue a device-side reset of the length counter.
    pub fn clear(&self, stream: &Stream) -> Result<()> {
        let length = Arc::clone(&self.length);
        stream.enqueue(move || length.store(0, Ordering::Relaxed))
    }

    /// Peer-to-peer receive: enqueue, on the source partition's stream, a
    /// copy of `src`'s messages into this box's back buffer.
    ///
    /// Running on the source stream serializes the copy after the producer
    /// kernel that filled `src`; no other fence is required.
    pub fn recv_from(&self, src: &MessageBox<M>, src_stream: &Stream) -> Result<()> {
        debug_assert!(self.capacity >= src.capacity);
        let src_buf = src.front();
        let src_len = src.length_cell();
        let dst_buf = Arc::clone(&self.back);
        let dst_len = Arc::clone(&self.length);
        src_stream.enqueue(move || {
            let n = src_len.load(Ordering::Relaxed) as usize;
            dst_buf.lock()[..n].copy_from_slice(&src_buf.lock()[..n]);
            dst_len.store(n as u64, Ordering::Relaxed);
        })
    }

    /// Exchange the front and back buffers.
    ///
    /// Host-side; the driver calls this exactly once per inbox per
    /// superstep, after all transfers have been synchronized.
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceId;

    fn fill_front(mbox: &MessageBox<u32>, messages: &[(u32, u32)]) {
        let buf = mbox.front();
        let mut buf = buf.lock();
        for (i, &(receiver, value)) in messages.iter().enumerate() {
            buf[i] = VertexMessage { receiver, value };
        }
        mbox.length_cell()
            .store(messages.len() as u64, Ordering::Relaxed);
    }

    #[test]
    fn test_clear_resets_length() {
        let stream = Stream::spawn(DeviceId(0)).unwrap();
        let mbox = MessageBox::<u32>::new(8);
        fill_front(&mbox, &[(0, 1), (1, 2)]);
        assert_eq!(mbox.len(), 2);

        mbox.clear(&stream).unwrap();
        stream.synchronize().unwrap();
        assert_eq!(mbox.len(), 0);
    }

    #[test]
    fn test_recv_copies_into_back() {
        let src_stream = Stream::spawn(DeviceId(0)).unwrap();
        let outbox = MessageBox::<u32>::new(4);
        let mut inbox = MessageBox::<u32>::new(4);

        fill_front(&outbox, &[(3, 30), (1, 10), (2, 20)]);
        inbox.recv_from(&outbox, &src_stream).unwrap();
        src_stream.synchronize().unwrap();

        // The back buffer holds exactly the source's messages; the front is
        // untouched until the swap.
        assert_eq!(inbox.len(), 3);
        inbox.swap_buffers();
        let front = inbox.front();
        let front = front.lock();
        assert_eq!(front[0], VertexMessage { receiver: 3, value: 30 });
        assert_eq!(front[1], VertexMessage { receiver: 1, value: 10 });
        assert_eq!(front[2], VertexMessage { receiver: 2, value: 20 });
    }

    #[test]
    fn test_recv_orders_after_producer() {
        let src_stream = Stream::spawn(DeviceId(0)).unwrap();
        let outbox = MessageBox::<u32>::new(2);
        let inbox = MessageBox::<u32>::new(2);

        // Producer work enqueued first on the source stream; the receive
        // enqueued afterwards must observe it.
        let buf = outbox.front();
        let len = outbox.length_cell();
        src_stream
            .enqueue(move || {
                buf.lock()[0] = VertexMessage { receiver: 7, value: 77 };
                len.store(1, Ordering::Relaxed);
            })
            .unwrap();
        inbox.recv_from(&outbox, &src_stream).unwrap();
        src_stream.synchronize().unwrap();

        assert_eq!(inbox.len(), 1);
    }

    #[test]
    fn test_double_buffering_isolates_reader() {
        let src_stream = Stream::spawn(DeviceId(0)).unwrap();
        let outbox = MessageBox::<u32>::new(2);
        let mut inbox = MessageBox::<u32>::new(2);

        fill_front(&outbox, &[(0, 1)]);
        inbox.recv_from(&outbox, &src_stream).unwrap();
        src_stream.synchronize().unwrap();
        inbox.swap_buffers();

        // A second delivery lands in the (new) back buffer and must not
        // disturb what the consumer reads from the front.
        fill_front(&outbox, &[(0, 2)]);
        inbox.recv_from(&outbox, &src_stream).unwrap();
        src_stream.synchronize().unwrap();

        let front = inbox.front();
        assert_eq!(front.lock()[0].value, 1);
        inbox.swap_buffers();
        let front = inbox.front();
        assert_eq!(front.lock()[0].value, 2);
    }

    #[test]
    fn test_empty_box() {
        let mbox = MessageBox::<u32>::new(0);
        assert_eq!(mbox.capacity(), 0);
        assert!(mbox.is_empty());
    }
}
