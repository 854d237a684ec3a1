//! Parsers for `/proc` filesystem files.
//!
//! Pure functions from file content to structured data, testable with plain
//! string input.

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

// ============ Memory ============

/// Parsed data from `/proc/meminfo`, in kB.
#[derive(Debug, Clone, Default)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub mem_available: u64,
    pub buffers: u64,
    pub cached: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

/// Parses `/proc/meminfo` content.
///
/// Fails if `MemTotal` is missing, which means the content is not meminfo.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();
    let mut seen_total = false;

    for line in content.lines() {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        let kb: u64 = rest
            .split_whitespace()
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        match name.trim() {
            "MemTotal" => {
                info.mem_total = kb;
                seen_total = true;
            }
            "MemFree" => info.mem_free = kb,
            "MemAvailable" => info.mem_available = kb,
            "Buffers" => info.buffers = kb,
            "Cached" => info.cached = kb,
            "SwapTotal" => info.swap_total = kb,
            "SwapFree" => info.swap_free = kb,
            _ => {}
        }
    }

    if !seen_total {
        return Err(ParseError::new("missing MemTotal in meminfo"));
    }
    Ok(info)
}

// ============ CPU ============

/// Tick counters of one `cpu` line in `/proc/stat`.
#[derive(Debug, Clone, Default)]
pub struct CpuStat {
    pub cpu_id: Option<u32>, // None for aggregate "cpu" line
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuStat {
    /// Ticks spent doing work.
    pub fn busy(&self) -> u64 {
        self.user + self.nice + self.system + self.irq + self.softirq + self.steal
    }

    /// Ticks spent idle or waiting on I/O.
    pub fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }
}

/// Global stats from `/proc/stat`.
#[derive(Debug, Clone, Default)]
pub struct GlobalStat {
    pub cpus: Vec<CpuStat>,
    pub ctxt: u64,
    pub btime: u64,
}

impl GlobalStat {
    /// The aggregate `cpu` line.
    pub fn total(&self) -> Option<&CpuStat> {
        self.cpus.iter().find(|cpu| cpu.cpu_id.is_none())
    }

    /// Number of per-CPU lines.
    pub fn cpu_count(&self) -> usize {
        self.cpus.iter().filter(|cpu| cpu.cpu_id.is_some()).count()
    }
}

/// Parses `/proc/stat` content.
pub fn parse_global_stat(content: &str) -> Result<GlobalStat, ParseError> {
    let mut stat = GlobalStat::default();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&name) = parts.first() else {
            continue;
        };
        let get_val =
            |idx: usize| -> u64 { parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        if let Some(suffix) = name.strip_prefix("cpu") {
            let cpu_id = if suffix.is_empty() {
                None
            } else {
                Some(
                    suffix
                        .parse()
                        .map_err(|_| ParseError::new(format!("invalid cpu line {:?}", name)))?,
                )
            };

            stat.cpus.push(CpuStat {
                cpu_id,
                user: get_val(1),
                nice: get_val(2),
                system: get_val(3),
                idle: get_val(4),
                iowait: get_val(5),
                irq: get_val(6),
                softirq: get_val(7),
                steal: get_val(8),
            });
        } else if name == "ctxt" {
            stat.ctxt = get_val(1);
        } else if name == "btime" {
            stat.btime = get_val(1);
        }
    }

    if stat.total().is_none() {
        return Err(ParseError::new("missing aggregate cpu line in stat"));
    }
    Ok(stat)
}

/// Parsed data from `/proc/cpuinfo`.
#[derive(Debug, Clone, Default)]
pub struct CpuInfo {
    /// `model name` of the first processor.
    pub model: String,
    /// Processor blocks found.
    pub processors: usize,
    /// Mean `cpu MHz` over processors that report it.
    pub mhz: Option<f64>,
}

/// Parses `/proc/cpuinfo` content.
pub fn parse_cpuinfo(content: &str) -> Result<CpuInfo, ParseError> {
    let mut info = CpuInfo::default();
    let mut mhz_sum = 0.0;
    let mut mhz_count = 0usize;

    for line in content.lines() {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match name.trim() {
            "processor" => info.processors += 1,
            "model name" if info.model.is_empty() => info.model = value.to_string(),
            "cpu MHz" => {
                let mhz: f64 = value
                    .parse()
                    .map_err(|_| ParseError::new(format!("invalid cpu MHz {:?}", value)))?;
                mhz_sum += mhz;
                mhz_count += 1;
            }
            _ => {}
        }
    }

    if info.processors == 0 {
        return Err(ParseError::new("no processor entries in cpuinfo"));
    }
    if mhz_count > 0 {
        info.mhz = Some(mhz_sum / mhz_count as f64);
    }
    Ok(info)
}

// ============ Load ============

/// Parsed data from `/proc/loadavg`.
#[derive(Debug, Clone, Default)]
pub struct LoadAvg {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
    pub running: u32,
    pub total: u32,
}

/// Parses `/proc/loadavg` content.
pub fn parse_loadavg(content: &str) -> Result<LoadAvg, ParseError> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(ParseError::new("invalid loadavg format"));
    }

    let load1 = parts[0]
        .parse()
        .map_err(|_| ParseError::new("invalid load1"))?;
    let load5 = parts[1]
        .parse()
        .map_err(|_| ParseError::new("invalid load5"))?;
    let load15 = parts[2]
        .parse()
        .map_err(|_| ParseError::new("invalid load15"))?;

    // Format: running/total
    let (running, total) = if let Some((r, t)) = parts[3].split_once('/') {
        (r.parse().unwrap_or(0), t.parse().unwrap_or(0))
    } else {
        (0, 0)
    };

    Ok(LoadAvg {
        load1,
        load5,
        load15,
        running,
        total,
    })
}

/// Parses `/proc/uptime`, returning seconds since boot.
pub fn parse_uptime(content: &str) -> Result<f64, ParseError> {
    content
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::new("empty uptime"))?
        .parse()
        .map_err(|_| ParseError::new("invalid uptime"))
}

// ============ Disk ============

/// One line of `/proc/diskstats`.
#[derive(Debug, Clone, Default)]
pub struct DiskStats {
    pub major: u32,
    pub minor: u32,
    /// Device name (sda, nvme0n1, etc.)
    pub device: String,
    /// Reads completed
    pub reads: u64,
    /// Sectors read
    pub read_sectors: u64,
    /// Writes completed
    pub writes: u64,
    /// Sectors written
    pub write_sectors: u64,
    /// Time spent doing I/Os (ms)
    pub io_time: u64,
}

/// Parses `/proc/diskstats` content.
///
/// Format: major minor name reads r_merged r_sectors r_time writes w_merged w_sectors w_time io_pending io_time w_io_time [discards ...]
pub fn parse_diskstats(content: &str) -> Result<Vec<DiskStats>, ParseError> {
    let mut disks = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 14 {
            continue; // Skip malformed lines
        }

        let get_val =
            |idx: usize| -> u64 { parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        disks.push(DiskStats {
            major: parts[0].parse().unwrap_or(0),
            minor: parts[1].parse().unwrap_or(0),
            device: parts[2].to_string(),
            reads: get_val(3),
            read_sectors: get_val(5),
            writes: get_val(7),
            write_sectors: get_val(9),
            io_time: get_val(12),
        });
    }

    Ok(disks)
}

/// Whether `name` is a partition of the disk `parent`.
///
/// Partitions append digits to the disk name (`sda1`, `vdb2`), or
/// `p<digits>` when the disk name already ends in a digit (`nvme0n1p1`,
/// `mmcblk0p1`, `md1p1`).
fn is_partition_of(name: &str, parent: &str) -> bool {
    let Some(suffix) = name.strip_prefix(parent) else {
        return false;
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    if parent.ends_with(|c: char| c.is_ascii_digit()) {
        suffix.strip_prefix('p').is_some_and(all_digits)
    } else {
        all_digits(suffix)
    }
}

/// Keeps whole physical disks: drops loop/ram/zram/device-mapper nodes and
/// any partition whose parent disk is also listed.
pub fn whole_disks(disks: &[DiskStats]) -> Vec<&DiskStats> {
    const VIRTUAL: [&str; 4] = ["loop", "ram", "zram", "dm-"];

    disks
        .iter()
        .filter(|d| !VIRTUAL.iter().any(|prefix| d.device.starts_with(prefix)))
        .filter(|d| {
            !disks
                .iter()
                .any(|parent| is_partition_of(&d.device, &parent.device))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meminfo() {
        let content = "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:         1000 kB
SwapTotal:       4096000 kB
SwapFree:        4000000 kB
";
        let info = parse_meminfo(content).unwrap();

        assert_eq!(info.mem_total, 16384000);
        assert_eq!(info.mem_free, 8192000);
        assert_eq!(info.mem_available, 12000000);
        assert_eq!(info.buffers, 512000);
        assert_eq!(info.cached, 2048000);
        assert_eq!(info.swap_total, 4096000);
        assert_eq!(info.swap_free, 4000000);
    }

    #[test]
    fn test_parse_meminfo_rejects_garbage() {
        assert!(parse_meminfo("not meminfo at all").is_err());
    }

    #[test]
    fn test_parse_global_stat() {
        let content = "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 5000 250 1500 40000 500 100 50 0 0 0
cpu1 5000 250 1500 40000 500 100 50 0 0 0
ctxt 500000
btime 1700000000
";
        let stat = parse_global_stat(content).unwrap();

        assert_eq!(stat.cpus.len(), 3);
        assert_eq!(stat.cpu_count(), 2);
        let total = stat.total().unwrap();
        assert_eq!(total.busy(), 10000 + 500 + 3000 + 200 + 100);
        assert_eq!(total.idle_total(), 81000);
        assert_eq!(stat.cpus[2].cpu_id, Some(1));
        assert_eq!(stat.ctxt, 500000);
        assert_eq!(stat.btime, 1700000000);
    }

    #[test]
    fn test_parse_global_stat_requires_aggregate() {
        assert!(parse_global_stat("ctxt 1\n").is_err());
    }

    #[test]
    fn test_parse_cpuinfo() {
        let content = "\
processor\t: 0
model name\t: AMD EPYC 7B13
cpu MHz\t\t: 2000.000

processor\t: 1
model name\t: AMD EPYC 7B13
cpu MHz\t\t: 3000.000
";
        let info = parse_cpuinfo(content).unwrap();
        assert_eq!(info.processors, 2);
        assert_eq!(info.model, "AMD EPYC 7B13");
        assert!((info.mhz.unwrap() - 2500.0).abs() < 0.001);
    }

    #[test]
    fn test_parse_cpuinfo_without_mhz() {
        // ARM boards commonly omit the clock line.
        let info = parse_cpuinfo("processor\t: 0\nBogoMIPS\t: 48.00\n").unwrap();
        assert_eq!(info.processors, 1);
        assert!(info.mhz.is_none());
        assert!(info.model.is_empty());
    }

    #[test]
    fn test_parse_loadavg() {
        let content = "0.15 0.10 0.05 1/150 1234\n";
        let load = parse_loadavg(content).unwrap();

        assert!((load.load1 - 0.15).abs() < 0.001);
        assert!((load.load5 - 0.10).abs() < 0.001);
        assert!((load.load15 - 0.05).abs() < 0.001);
        assert_eq!(load.running, 1);
        assert_eq!(load.total, 150);
    }

    #[test]
    fn test_parse_loadavg_invalid() {
        assert!(parse_loadavg("0.15 0.10").is_err());
        assert!(parse_loadavg("x 0.10 0.05 1/150 1").is_err());
    }

    #[test]
    fn test_parse_uptime() {
        assert!((parse_uptime("12345.67 98765.43\n").unwrap() - 12345.67).abs() < 0.001);
        assert!(parse_uptime("").is_err());
    }

    #[test]
    fn test_parse_diskstats() {
        let content = "\
   8       0 sda 1234 0 56789 100 5678 0 98765 200 0 150 300 0 0 0 0
   8       1 sda1 1000 0 50000 80 5000 0 90000 180 0 130 260 0 0 0 0
 259       0 nvme0n1 9999 0 123456 500 8888 0 654321 400 5 1000 2000 0 0 0 0
garbage line
";
        let disks = parse_diskstats(content).unwrap();

        assert_eq!(disks.len(), 3);
        assert_eq!(disks[0].major, 8);
        assert_eq!(disks[0].device, "sda");
        assert_eq!(disks[0].reads, 1234);
        assert_eq!(disks[0].read_sectors, 56789);
        assert_eq!(disks[0].writes, 5678);
        assert_eq!(disks[0].write_sectors, 98765);
        assert_eq!(disks[0].io_time, 150);
        assert_eq!(disks[2].device, "nvme0n1");
    }

    #[test]
    fn test_whole_disks_skip_partitions_and_virtual() {
        let content = "\
   8       0 sda 1 0 1 0 1 0 1 0 0 1 1
   8       1 sda1 1 0 1 0 1 0 1 0 0 1 1
 259       0 nvme0n1 1 0 1 0 1 0 1 0 0 1 1
 259       1 nvme0n1p1 1 0 1 0 1 0 1 0 0 1 1
   7       0 loop0 1 0 1 0 1 0 1 0 0 1 1
 253       0 dm-0 1 0 1 0 1 0 1 0 0 1 1
";
        let disks = parse_diskstats(content).unwrap();
        let names: Vec<&str> = whole_disks(&disks)
            .into_iter()
            .map(|d| d.device.as_str())
            .collect();
        assert_eq!(names, vec!["sda", "nvme0n1"]);
    }

    #[test]
    fn test_whole_disks_keep_disks_sharing_a_prefix() {
        let content = "\
   9       1 md1 1 0 1 0 1 0 1 0 0 1 1
   9      10 md10 1 0 1 0 1 0 1 0 0 1 1
 259       3 md1p1 1 0 1 0 1 0 1 0 0 1 1
  65     160 sdaa 1 0 1 0 1 0 1 0 0 1 1
  65     161 sdaa1 1 0 1 0 1 0 1 0 0 1 1
   8       0 sda 1 0 1 0 1 0 1 0 0 1 1
   8       2 sda2 1 0 1 0 1 0 1 0 0 1 1
 259       0 nvme0n1 1 0 1 0 1 0 1 0 0 1 1
 259       9 nvme0n10 1 0 1 0 1 0 1 0 0 1 1
";
        let disks = parse_diskstats(content).unwrap();
        let names: Vec<&str> = whole_disks(&disks)
            .into_iter()
            .map(|d| d.device.as_str())
            .collect();
        assert_eq!(names, vec!["md1", "md10", "sdaa", "sda", "nvme0n1", "nvme0n10"]);
    }

    #[test]
    fn test_is_partition_of() {
        assert!(is_partition_of("sda1", "sda"));
        assert!(is_partition_of("nvme0n1p3", "nvme0n1"));
        assert!(is_partition_of("mmcblk0p1", "mmcblk0"));
        assert!(!is_partition_of("sdaa", "sda"));
        assert!(!is_partition_of("md10", "md1"));
        assert!(!is_partition_of("nvme0n1", "nvme0n1"));
        assert!(!is_partition_of("nvme0n1p", "nvme0n1"));
    }
}
