//! Pre-built mock fixtures for testing collectors.
//!
//! These scenarios provide a realistic Linux host state so tests exercise
//! whole collectors instead of wiring every file and command by hand.

use super::filesystem::MockFs;
use super::runner::MockRunner;

impl MockFs {
    /// Creates a typical Linux desktop with three processes.
    pub fn typical_host() -> Self {
        let mut fs = Self::new();

        fs.add_file("/proc/sys/kernel/osrelease", "6.8.0-41-generic\n");
        fs.add_file("/proc/sys/kernel/hostname", "devbox\n");
        fs.add_file(
            "/etc/os-release",
            "\
NAME=\"Ubuntu\"
VERSION_ID=\"24.04\"
ID=ubuntu
ID_LIKE=debian
BUILD_ID=20240801
",
        );
        fs.add_file("/etc/machine-id", "8f2b9c3e4d5a6f708192a3b4c5d6e7f8\n");
        fs.add_file(
            "/etc/passwd",
            "\
root:x:0:0:root:/root:/bin/bash
daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin
nobody:x:65534:65534:nobody:/nonexistent:/usr/sbin/nologin
user:x:1000:1000:User:/home/user:/bin/bash
",
        );

        fs.add_file("/sys/class/dmi/id/board_vendor", "ASUSTeK COMPUTER INC.\n");
        fs.add_file("/sys/class/dmi/id/board_name", "PRIME B550-PLUS\n");
        fs.add_file("/sys/class/dmi/id/bios_version", "2803\n");
        fs.add_file("/sys/class/dmi/id/bios_date", "04/27/2023\n");

        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16777216 kB
MemFree:         4194304 kB
MemAvailable:    8388608 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapTotal:       4194304 kB
SwapFree:        4194304 kB
",
        );
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );
        fs.add_file("/proc/loadavg", "0.15 0.10 0.05 1/150 1234\n");
        fs.add_file(
            "/proc/net/dev",
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 12345678     9876    0    0    0     0          0         0 12345678     9876    0    0    0     0       0          0
  eth0: 987654321   654321    5   10    0     0          0       100 123456789   456789    2    5    0     0       0          0
",
        );
        fs.add_file(
            "/proc/self/status",
            "\
Name:\tsysreport
Umask:\t0022
State:\tR (running)
Pid:\t4242
PPid:\t1000
Uid:\t1000\t1000\t1000\t1000
Gid:\t1000\t1000\t1000\t1000
",
        );

        fs.add_process(
            1,
            "1 (systemd) S 0 1 1 0 -1 4194560 100 0 0 0 120 80 0 0 20 0 1 0 2 12345678 2900 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0",
            "systemd\n",
        );
        fs.add_process(
            1234,
            "1234 (bash) S 1 1234 1234 0 -1 4194304 100 0 0 0 50 25 0 0 20 0 1 0 12345 12345678 1200 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0",
            "bash\n",
        );
        fs.add_process(
            4242,
            "4242 (cargo) R 1234 4242 1234 0 -1 4194304 100 0 0 0 900 300 0 0 20 0 4 0 23456 12345678 25000 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0",
            "cargo\n",
        );

        fs
    }
}

impl MockRunner {
    /// Canned command outputs matching [`MockFs::typical_host`].
    pub fn typical_host() -> Self {
        let mut runner = Self::new();

        runner.succeed(
            "hostnamectl status",
            "\
 Static hostname: devbox
       Icon name: computer-desktop
         Chassis: desktop
      Machine ID: 8f2b9c3e4d5a6f708192a3b4c5d6e7f8
         Boot ID: 0a1b2c3d4e5f60718293a4b5c6d7e8f9
Operating System: Ubuntu 24.04.1 LTS
          Kernel: Linux 6.8.0-41-generic
    Architecture: x86-64
 Hardware Vendor: ASUSTeK COMPUTER INC.
  Hardware Model: PRIME B550-PLUS
Firmware Version: 2803
   Firmware Date: 04/27/2023
",
        );
        runner.succeed(
            "lscpu",
            "\
Architecture:        x86_64
CPU(s):              16
Thread(s) per core:  2
Core(s) per socket:  8
Socket(s):           1
Vendor ID:           AuthenticAMD
Model name:          AMD Ryzen 7 5800X 8-Core Processor
CPU max MHz:         4850.1948
CPU min MHz:         2200.0000
L1d cache:           256 KiB
L2 cache:            4 MiB
L3 cache:            32 MiB
Virtualization:      AMD-V
",
        );
        runner.succeed(
            "lspci",
            "\
00:02.0 VGA compatible controller: Advanced Micro Devices, Inc. [AMD/ATI] Cezanne (rev c8)
02:00.0 Ethernet controller: Realtek RTL8111/8168/8411
",
        );
        runner.succeed(
            "lsblk -o NAME,MAJ:MIN,RM,SIZE,RO,TYPE,MOUNTPOINTS --json",
            r#"{
  "blockdevices": [
    {"name": "nvme0n1", "maj:min": "259:0", "rm": false, "size": "465.8G", "ro": false, "type": "disk", "mountpoints": [null],
     "children": [
        {"name": "nvme0n1p1", "maj:min": "259:1", "rm": false, "size": "512M", "ro": false, "type": "part", "mountpoints": ["/boot/efi"]},
        {"name": "nvme0n1p2", "maj:min": "259:2", "rm": false, "size": "465.3G", "ro": false, "type": "part", "mountpoints": ["/"]}
     ]}
  ]
}"#,
        );
        runner.succeed(
            "df -h",
            "\
Filesystem      Size  Used Avail Use% Mounted on
/dev/nvme0n1p2  458G  120G  315G  28% /
/dev/nvme0n1p1  511M  6.1M  505M   2% /boot/efi
tmpfs           7.8G  1.2M  7.8G   1% /run
",
        );
        runner.succeed(
            "ip -json addr",
            r#"[
  {"ifname": "lo", "addr_info": [{"family": "inet", "local": "127.0.0.1", "prefixlen": 8}]},
  {"ifname": "eth0", "addr_info": [{"family": "inet", "local": "192.168.1.10", "prefixlen": 24, "broadcast": "192.168.1.255"}]}
]"#,
        );
        runner.succeed("id -Gn", "user adm sudo docker\n");

        runner.succeed("git --version", "git version 2.43.0\n");
        runner.succeed("git rev-parse --is-inside-work-tree", "true\n");
        runner.succeed("git rev-parse --abbrev-ref HEAD", "main\n");
        runner.succeed("git status --short", " M src/main.rs\n?? notes.txt\n");
        runner.succeed(
            "git log -1 --pretty=format:%h - %s (%ci)",
            "abc1234 - Add disk usage join (2024-08-01 10:00:00 +0000)",
        );

        runner
    }
}
