//! Integration tests for awsmap

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn awsmap() -> Command {
        let mut cmd = cargo_bin_cmd!("awsmap");
        cmd.env_remove("AWS_PROFILE")
            .env_remove("AWS_REGION")
            .env_remove("AWSMAP_CONFIG")
            .env_remove("AWSMAP_CACHE_DIR");
        cmd
    }

    #[test]
    fn help_displays() {
        awsmap()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("AWS network topology"));
    }

    #[test]
    fn version_displays() {
        awsmap()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("awsmap"));
    }

    #[test]
    fn config_path_honours_flag() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        awsmap()
            .args(["--config", path.to_str().unwrap(), "config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("custom.toml"));
    }

    #[test]
    fn config_show_reflects_overrides() {
        let temp = TempDir::new().unwrap();
        awsmap()
            .args(["--config", temp.path().join("none.toml").to_str().unwrap()])
            .args(["--region", "eu-central-1", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[aws]"))
            .stdout(predicate::str::contains("eu-central-1"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[aws\nregion = 1").unwrap();
        awsmap()
            .args(["--config", path.to_str().unwrap(), "cache", "path"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn cache_path_honours_flag() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("responses");
        awsmap()
            .args(["--cache-dir", dir.to_str().unwrap(), "cache", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("responses"));
    }

    #[test]
    fn unknown_format_is_rejected() {
        awsmap()
            .args(["--format", "gif", "vpcs"])
            .assert()
            .failure();
    }
}

mod compose_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    const STACK: &str = "\
services:
  web:
    image: nginx
    ports:
      - \"8080:80\"
    depends_on:
      - api
  api:
    volumes:
      - ./src:/app
  db:
    volumes:
      - pgdata:/var/lib/postgresql/data
";

    fn awsmap(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("awsmap");
        cmd.env("AWSMAP_CONFIG", temp.path().join("config.toml"))
            .env("AWSMAP_CACHE_DIR", temp.path().join("cache"));
        cmd
    }

    #[test]
    fn writes_dot_under_dc() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("docker-compose.yml");
        std::fs::write(&file, STACK).unwrap();
        let out = temp.path().join("images");

        awsmap(&temp)
            .args(["-o", out.to_str().unwrap(), "--format", "dot"])
            .arg("docker-compose")
            .arg(&file)
            .assert()
            .success();

        let dot = std::fs::read_to_string(out.join("dc").join("docker-compose.dot")).unwrap();
        assert!(dot.contains("digraph \"docker-compose.yml\""));
        assert!(dot.contains("8080:80"));
        assert!(dot.contains("localhost"));
        assert!(dot.contains("color=\"red\""));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("docker-compose.yml");
        std::fs::write(&file, STACK).unwrap();
        let out = temp.path().join("images");

        awsmap(&temp)
            .args(["--dryrun", "-o", out.to_str().unwrap()])
            .arg("docker-compose")
            .arg(&file)
            .assert()
            .success()
            .stdout(predicate::str::contains("[dry-run]"));

        assert!(!out.exists());
    }

    #[test]
    fn undeclared_dependency_fails() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("docker-compose.yml");
        std::fs::write(&file, "services:\n  web:\n    depends_on: [cache]\n").unwrap();

        awsmap(&temp)
            .args(["--format", "dot", "-o", temp.path().join("images").to_str().unwrap()])
            .arg("docker-compose")
            .arg(&file)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Malformed manifest"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn missing_file_fails() {
        let temp = TempDir::new().unwrap();
        awsmap(&temp)
            .args(["docker-compose", "no-such-compose.yml"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }
}

mod network_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use serde_json::{json, Value};
    use std::path::Path;
    use tempfile::TempDir;

    const PROFILE: &str = "mapper";
    const ACCOUNT: &str = "111122223333";

    fn write(path: &Path, value: Value) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }

    /// Seed a cache so no `aws` process is ever needed
    fn seed_cache(root: &Path) {
        write(
            &root.join("profiles").join(format!("global_{}_caller_identity.json", PROFILE)),
            json!({"Account": ACCOUNT, "Arn": "arn:aws:iam::111122223333:user/mapper"}),
        );

        let account = root.join(ACCOUNT);
        write(
            &account.join("global_account_aliases.json"),
            json!({"AccountAliases": ["acme"]}),
        );
        write(
            &account.join("us-east-1_vpcs.json"),
            json!({"Vpcs": [{
                "VpcId": "vpc-1",
                "CidrBlock": "10.0.0.0/16",
                "Tags": [{"Key": "Name", "Value": "core"}]
            }]}),
        );
        write(
            &account.join("us-east-1_vpc_peer_connections_vpc-1.json"),
            json!({"VpcPeeringConnections": [{
                "VpcPeeringConnectionId": "pcx-1",
                "AccepterVpcInfo": {"VpcId": "vpc-1", "CidrBlock": "10.0.0.0/16"},
                "RequesterVpcInfo": {"VpcId": "vpc-9", "CidrBlock": "10.9.0.0/16"}
            }]}),
        );
        write(
            &account.join("us-east-1_vpc-1_igws.json"),
            json!({"InternetGateways": [{"InternetGatewayId": "igw-1"}]}),
        );
        write(
            &account.join("us-east-1_vpc-1_nat_gws.json"),
            json!({"NatGateways": [{"NatGatewayId": "nat-1"}]}),
        );
        write(
            &account.join("us-east-1_vpc-1_vpn_gateways.json"),
            json!({"VpnGateways": []}),
        );
        write(
            &account.join("us-east-1_vpc-1_transit_gateways.json"),
            json!({"TransitGatewayVpcAttachments": []}),
        );
        write(
            &account.join("us-east-1_vpc-1_subnets.json"),
            json!({"Subnets": [
                {"SubnetId": "subnet-a", "VpcId": "vpc-1", "CidrBlock": "10.0.1.0/24", "AvailabilityZone": "us-east-1a"},
                {"SubnetId": "subnet-b", "VpcId": "vpc-1", "CidrBlock": "10.0.2.0/24", "AvailabilityZone": "us-east-1b"}
            ]}),
        );
        write(
            &account.join("us-east-1_vpc-1_route_tables.json"),
            json!({"RouteTables": [
                {
                    "RouteTableId": "rtb-public",
                    "Associations": [{"SubnetId": "subnet-a"}],
                    "Routes": [{"DestinationCidrBlock": "0.0.0.0/0", "GatewayId": "igw-1"}]
                },
                {
                    "RouteTableId": "rtb-private",
                    "Associations": [{"SubnetId": "subnet-b"}],
                    "Routes": [{"DestinationCidrBlock": "0.0.0.0/0", "NatGatewayId": "nat-1"}]
                }
            ]}),
        );
    }

    fn awsmap(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("awsmap");
        cmd.env("AWSMAP_CONFIG", temp.path().join("config.toml"))
            .env_remove("AWS_REGION")
            .args(["--cache-dir", temp.path().join("cache").to_str().unwrap()])
            .args(["--profile", PROFILE, "--region", "us-east-1"])
            .args(["--output-dir", temp.path().join("images").to_str().unwrap()])
            .args(["--format", "dot"])
            // Any attempt to reach AWS fails loudly
            .env("PATH", "");
        cmd
    }

    #[test]
    fn network_renders_from_seeded_cache() {
        let temp = TempDir::new().unwrap();
        seed_cache(&temp.path().join("cache"));

        awsmap(&temp).arg("network").assert().success();

        let dir = temp.path().join("images").join(ACCOUNT);
        let vpcs = std::fs::read_to_string(dir.join("vpcs.dot")).unwrap();
        assert!(vpcs.contains("digraph \"acme\""));
        assert!(vpcs.contains("10.9.0.0/16"));

        let subnets = std::fs::read_to_string(dir.join("subnets_vpc-1.dot")).unwrap();
        assert!(subnets.contains("digraph \"vpc-1\""));
        assert!(subnets.contains("10.0.1.0/24"));
        assert!(subnets.contains("10.0.2.0/24"));
        assert_eq!(subnets.matches(" -> ").count(), 2);
    }

    #[test]
    fn subnets_for_unknown_vpc_fails() {
        let temp = TempDir::new().unwrap();
        seed_cache(&temp.path().join("cache"));

        awsmap(&temp)
            .args(["subnets", "--vpc-id", "vpc-404"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("vpc-404"));
    }

    #[test]
    fn cache_list_shows_seeded_entries() {
        let temp = TempDir::new().unwrap();
        seed_cache(&temp.path().join("cache"));

        awsmap(&temp)
            .args(["cache", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("111122223333/us-east-1_vpcs"))
            .stdout(predicate::str::contains("profiles/global_mapper_caller_identity"));
    }

    #[test]
    fn clear_cache_then_fetch_needs_aws() {
        let temp = TempDir::new().unwrap();
        let cache = temp.path().join("cache");
        seed_cache(&cache);

        awsmap(&temp)
            .args(["clear-cache", "-y"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache cleared"));
        assert!(!cache.exists());

        awsmap(&temp)
            .arg("vpcs")
            .assert()
            .failure()
            .stderr(predicate::str::contains("AWS CLI"));
    }
}
