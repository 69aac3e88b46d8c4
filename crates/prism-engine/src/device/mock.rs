//! Recording backend for tests.
//!
//! Every device call is appended to a shared [`Journal`]; handles count their
//! own releases on drop.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

use super::traits::{
    ClearColor, GraphicsDevice, PassEncoder, PipelineDesc, PresentationSurface, SchedulingHost,
};
use crate::error::{RenderError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CreateBuffer { id: u32, size: u64 },
    CreateBindGroup { id: u32, buffer: u32 },
    CreatePipeline { fragment_entry: String, uniform_size: u64 },
    WriteBuffer { buffer: u32, offset: u64, values: Vec<f32> },
    BeginPass { clear: ClearColor },
    SetPipeline,
    SetBindGroup { index: u32, group: u32 },
    Draw { vertices: Range<u32> },
    EndPass,
    Submit,
    Configure { width: u32, height: u32 },
}

#[derive(Debug, Default)]
pub struct Journal {
    pub events: Vec<Event>,
    pub memory: HashMap<u32, Vec<f32>>,
    pub live_buffers: usize,
    pub live_bind_groups: usize,
    pub released_buffers: usize,
    pub released_bind_groups: usize,
    pub released_pipelines: usize,
}

pub type SharedJournal = Rc<RefCell<Journal>>;

#[derive(Default)]
pub struct MockDevice {
    pub journal: SharedJournal,
    next_id: Cell<u32>,
    /// Number of buffers that may still be created; `None` is unlimited.
    buffer_budget: Cell<Option<usize>>,
    lost: RefCell<Option<String>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buffer_budget(budget: usize) -> Self {
        let device = Self::default();
        device.buffer_budget.set(Some(budget));
        device
    }

    pub fn lose(&self, reason: &str) {
        *self.lost.borrow_mut() = Some(reason.to_string());
    }

    pub fn events(&self) -> Vec<Event> {
        self.journal.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.journal.borrow_mut().events.clear();
    }

    fn next_id(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn record(&self, event: Event) {
        self.journal.borrow_mut().events.push(event);
    }
}

pub struct MockBuffer {
    pub id: u32,
    journal: SharedJournal,
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        let mut j = self.journal.borrow_mut();
        j.live_buffers -= 1;
        j.released_buffers += 1;
    }
}

pub struct MockBindGroup {
    pub id: u32,
    journal: SharedJournal,
}

impl Drop for MockBindGroup {
    fn drop(&mut self) {
        let mut j = self.journal.borrow_mut();
        j.live_bind_groups -= 1;
        j.released_bind_groups += 1;
    }
}

pub struct MockPipeline {
    journal: SharedJournal,
}

impl Drop for MockPipeline {
    fn drop(&mut self) {
        self.journal.borrow_mut().released_pipelines += 1;
    }
}

pub struct MockView;

pub struct MockEncoder;

pub struct MockPass<'e> {
    journal: SharedJournal,
    _encoder: &'e mut MockEncoder,
}

impl Drop for MockPass<'_> {
    fn drop(&mut self) {
        self.journal.borrow_mut().events.push(Event::EndPass);
    }
}

impl PassEncoder<MockDevice> for MockPass<'_> {
    fn set_pipeline(&mut self, _pipeline: &MockPipeline) {
        self.journal.borrow_mut().events.push(Event::SetPipeline);
    }

    fn set_bind_group(&mut self, index: u32, group: &MockBindGroup) {
        self.journal
            .borrow_mut()
            .events
            .push(Event::SetBindGroup { index, group: group.id });
    }

    fn draw(&mut self, vertices: Range<u32>) {
        self.journal.borrow_mut().events.push(Event::Draw { vertices });
    }
}

impl GraphicsDevice for MockDevice {
    type Buffer = MockBuffer;
    type BindGroup = MockBindGroup;
    type Pipeline = MockPipeline;
    type Format = ();
    type View = MockView;
    type Encoder = MockEncoder;
    type Pass<'e> = MockPass<'e>;

    fn create_uniform_buffer(&self, label: &str, size: u64) -> Result<MockBuffer> {
        if let Some(budget) = self.buffer_budget.get() {
            if budget == 0 {
                return Err(RenderError::ResourceExhausted(format!("{label}: budget spent")));
            }
            self.buffer_budget.set(Some(budget - 1));
        }

        let id = self.next_id();
        self.record(Event::CreateBuffer { id, size });
        let mut j = self.journal.borrow_mut();
        j.live_buffers += 1;
        j.memory.insert(id, vec![0.0; (size / 4) as usize]);
        Ok(MockBuffer {
            id,
            journal: Rc::clone(&self.journal),
        })
    }

    fn create_bind_group(
        &self,
        _label: &str,
        _pipeline: &MockPipeline,
        buffer: &MockBuffer,
    ) -> Result<MockBindGroup> {
        let id = self.next_id();
        self.record(Event::CreateBindGroup { id, buffer: buffer.id });
        self.journal.borrow_mut().live_bind_groups += 1;
        Ok(MockBindGroup {
            id,
            journal: Rc::clone(&self.journal),
        })
    }

    fn create_render_pipeline(&self, desc: &PipelineDesc<'_>, _format: ()) -> Result<MockPipeline> {
        self.record(Event::CreatePipeline {
            fragment_entry: desc.fragment_entry.to_string(),
            uniform_size: desc.uniform_size,
        });
        Ok(MockPipeline {
            journal: Rc::clone(&self.journal),
        })
    }

    fn write_buffer(&self, buffer: &MockBuffer, offset: u64, data: &[u8]) {
        let values: Vec<f32> = data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        let mut j = self.journal.borrow_mut();
        let start = (offset / 4) as usize;
        if let Some(mem) = j.memory.get_mut(&buffer.id) {
            mem[start..start + values.len()].copy_from_slice(&values);
        }
        j.events.push(Event::WriteBuffer {
            buffer: buffer.id,
            offset,
            values,
        });
    }

    fn create_command_encoder(&self, _label: &str) -> MockEncoder {
        MockEncoder
    }

    fn begin_render_pass<'e>(
        &self,
        encoder: &'e mut MockEncoder,
        _view: &MockView,
        clear: ClearColor,
    ) -> MockPass<'e> {
        self.record(Event::BeginPass { clear });
        MockPass {
            journal: Rc::clone(&self.journal),
            _encoder: encoder,
        }
    }

    fn submit(&self, _encoder: MockEncoder) {
        self.record(Event::Submit);
    }

    fn lost_reason(&self) -> Option<String> {
        self.lost.borrow().clone()
    }
}

/// What the next `acquire` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquireMode {
    #[default]
    Ready,
    Skip,
    OutOfMemory,
}

#[derive(Default)]
pub struct MockSurface {
    pub mode: AcquireMode,
    pub configured: Vec<(u32, u32)>,
}

impl PresentationSurface<MockDevice> for MockSurface {
    type Image = MockView;

    fn format(&self) {}

    fn configure(&mut self, device: &MockDevice, width: u32, height: u32) {
        device.record(Event::Configure { width, height });
        self.configured.push((width, height));
    }

    fn acquire(&mut self, _device: &MockDevice) -> Result<Option<MockView>> {
        match self.mode {
            AcquireMode::Ready => Ok(Some(MockView)),
            AcquireMode::Skip => Ok(None),
            AcquireMode::OutOfMemory => Err(RenderError::ResourceExhausted("mock oom".into())),
        }
    }

    fn view(image: &MockView) -> &MockView {
        image
    }

    fn present(&mut self, _image: MockView) {}
}

/// Counts tick requests and remembers whether presentation was announced.
#[derive(Default)]
pub struct MockHost {
    pub requests: Cell<usize>,
    pub presents: Cell<usize>,
}

impl SchedulingHost for MockHost {
    fn request_next_tick(&self) {
        self.requests.set(self.requests.get() + 1);
    }

    fn before_present(&self) {
        self.presents.set(self.presents.get() + 1);
    }
}
