use std::time::{Duration, Instant};

/// 按阶段累计耗时的计时器。
#[derive(Clone, Debug)]
pub struct StageTimer {
    stages: Vec<(&'static str, Duration)>,
    since: Instant,
}

impl StageTimer {
    /// 初始化计时器。初始化时会视为已经调用一次`self.start()`。
    #[inline]
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            since: Instant::now(),
        }
    }

    /// 开始计时。
    #[inline]
    pub fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时，并将这一区间的时间累计到阶段`stage`上。上一次调用必须是`self.start()`，否则时间计算值无意义。
    pub fn elapsed(&mut self, stage: &'static str) {
        let spent = self.since.elapsed();
        match self.stages.iter_mut().find(|(name, _)| *name == stage) {
            Some((_, total)) => *total += spent,
            None => self.stages.push((stage, spent)),
        }
    }

    /// 按首次出现的顺序列出各阶段及其累计时间。
    pub fn stages(&self) -> &[(&'static str, Duration)] {
        self.stages.as_slice()
    }

    /// 某一阶段累计的时间（以毫秒为单位）。
    pub fn stage_ms(&self, stage: &str) -> Option<u64> {
        self.stages
            .iter()
            .find(|(name, _)| *name == stage)
            .map(|(_, d)| d.as_millis() as u64)
    }

    /// 所有阶段累计的时间总和（以毫秒为单位）。
    pub fn get_total_ms(&self) -> u64 {
        self.stages
            .iter()
            .map(|(_, d)| *d)
            .sum::<Duration>()
            .as_millis() as u64
    }

    /// 以`info`级别输出各阶段耗时。
    pub fn summary(&self) {
        log::info!("----------------------------------------------------------");
        for (name, d) in self.stages.iter() {
            log::info!("{name}: {} ms", d.as_millis());
        }
        log::info!("总耗时: {} ms", self.get_total_ms());
        log::info!("----------------------------------------------------------");
    }
}

impl Default for StageTimer {
    fn default() -> Self {
        Self::new()
    }
}
