fn main() {
    lidar_scan_pipeline::cli::run();
}
